use serde::Deserialize;

use crate::api::plant_model_dto::PlantModelDto;

/// Root of a kernel configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelDto {
    #[serde(default)]
    pub scheduler: SchedulerConfigDto,
    pub plant_model: PlantModelDto,
    #[serde(default)]
    pub vehicles: Vec<VehicleDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfigDto {
    #[serde(default)]
    pub strict_free: bool,
    pub deferred_queue_warn_threshold: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDto {
    pub name: String,
    #[serde(default)]
    pub route: Vec<RouteStepDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStepDto {
    pub path: Option<String>,
    pub point: String,
}
