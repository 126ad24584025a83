use std::fmt;

use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::scheduler::scheduler_client::SharedClient;
use crate::domain::scheduler::task_handle::TaskHandle;
use crate::domain::utils::id::ClientId;

/// An allocation request that could not be granted yet.
#[derive(Clone)]
pub struct PendingAllocation {
    pub client: SharedClient,
    pub resources: ResourceSet,

    /// Handle of the attempt this request belongs to; cancelling it drops the request.
    pub task: TaskHandle,
}

impl PendingAllocation {
    pub fn new(client: SharedClient, resources: ResourceSet, task: TaskHandle) -> Self {
        Self { client, resources, task }
    }

    pub fn get_client_id(&self) -> ClientId {
        self.client.get_id()
    }
}

impl fmt::Debug for PendingAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAllocation")
            .field("client", &self.client.get_id())
            .field("resources", &self.resources)
            .field("task", &self.task.get_id())
            .finish()
    }
}
