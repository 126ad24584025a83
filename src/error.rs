use thiserror::Error;

use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::utils::id::{ClientId, ResourceName};

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse kernel configuration JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to build plant model: {0}")]
    ModelConstructionError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource {0} is not part of the plant model")]
    UnknownResource(ResourceName),

    #[error("Resource {resource} was not previously allocated by client {client}")]
    NotAllocated { client: ClientId, resource: ResourceName },

    #[error("Resources {resources} are not available for client {client}")]
    ResourcesUnavailable { client: ClientId, resources: ResourceSet },

    #[error("Scheduler is not running")]
    SchedulerNotRunning,

    #[error("Scheduler is already running")]
    SchedulerAlreadyRunning,
}

pub type Result<T> = std::result::Result<T, Error>;
