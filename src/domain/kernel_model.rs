use std::collections::HashSet;

use crate::api::kernel_dto::{KernelDto, VehicleDto};
use crate::api::plant_model_dto::PlantModelDto;
use crate::domain::resource::resource::{Block, Resource, ResourceKind};
use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::resource::resource_store::ResourceStore;
use crate::domain::route::route::{Route, RouteStep};
use crate::domain::scheduler::scheduler_config::SchedulerConfig;
use crate::domain::utils::id::{ResourceName, VehicleId};
use crate::error::Error;

#[derive(Debug, Clone)]
pub struct VehicleRoute {
    pub vehicle: VehicleId,
    pub route: Route,
}

/// Everything a kernel configuration file describes.
#[derive(Debug, Clone)]
pub struct KernelModel {
    pub plant_model: ResourceStore,
    pub scheduler_config: SchedulerConfig,
    pub vehicles: Vec<VehicleRoute>,
}

impl TryFrom<PlantModelDto> for ResourceStore {
    type Error = Error;

    fn try_from(dto: PlantModelDto) -> Result<Self, Error> {
        let point_names: HashSet<&str> = dto.points.iter().map(|point| point.name.as_str()).collect();
        let mut all_names: HashSet<&str> = point_names.clone();
        all_names.extend(dto.paths.iter().map(|path| path.name.as_str()));
        all_names.extend(dto.locations.iter().map(|location| location.name.as_str()));

        let mut resources: Vec<(Resource, &Vec<String>)> = Vec::new();
        for point in &dto.points {
            resources.push((Resource::new(point.name.as_str(), ResourceKind::Point), &point.attached));
        }
        for location in &dto.locations {
            resources.push((Resource::new(location.name.as_str(), ResourceKind::Location), &location.attached));
        }
        for path in &dto.paths {
            for endpoint in [&path.source_point, &path.destination_point] {
                if !point_names.contains(endpoint.as_str()) {
                    return Err(Error::ModelConstructionError(format!("Path {} references unknown point {}.", path.name, endpoint)));
                }
            }
            resources.push((Resource::new(path.name.as_str(), ResourceKind::Path), &path.attached));
        }

        let store = ResourceStore::new();
        for (mut resource, attached) in resources {
            for name in attached {
                if !all_names.contains(name.as_str()) {
                    return Err(Error::ModelConstructionError(format!("Resource {} has unknown attached resource {}.", resource.name, name)));
                }
                resource.attached.insert(ResourceName::new(name.as_str()));
            }
            store.add(resource)?;
        }

        for block in dto.blocks {
            let members: ResourceSet = block.members.iter().map(|member| member.as_str()).collect();
            store.add_block(Block::new(block.name.as_str(), members))?;
        }

        log::info!(
            "Plant model constructed with {} points, {} paths and {} locations.",
            store.count_by_kind(ResourceKind::Point),
            store.count_by_kind(ResourceKind::Path),
            store.count_by_kind(ResourceKind::Location)
        );
        Ok(store)
    }
}

impl VehicleRoute {
    fn try_from_dto(dto: VehicleDto, plant_model: &ResourceStore) -> Result<Self, Error> {
        let steps: Vec<RouteStep> = dto.route.iter().map(|step| RouteStep::new(step.path.as_deref(), &step.point)).collect();
        let route = Route::new(steps);

        for resources in route.to_claim() {
            plant_model.validate(&resources).map_err(|e| Error::ModelConstructionError(format!("Route of vehicle {}: {}", dto.name, e)))?;
        }

        Ok(VehicleRoute { vehicle: VehicleId::new(dto.name), route })
    }
}

impl TryFrom<KernelDto> for KernelModel {
    type Error = Error;

    fn try_from(dto: KernelDto) -> Result<Self, Error> {
        let plant_model = ResourceStore::try_from(dto.plant_model)?;
        let scheduler_config = SchedulerConfig::from(dto.scheduler);

        let vehicles =
            dto.vehicles.into_iter().map(|vehicle| VehicleRoute::try_from_dto(vehicle, &plant_model)).collect::<Result<Vec<_>, Error>>()?;

        Ok(KernelModel { plant_model, scheduler_config, vehicles })
    }
}
