use crate::domain::reservation::reservation_pool::ReservationPool;
use crate::domain::resource::resource::Block;
use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::resource::resource_store::ResourceStore;
use crate::domain::utils::id::ClientId;

/// Additional allocation rule consulted before any grant.
///
/// A veto is treated exactly like contention: `allocate` requests are deferred
/// and retried, `allocate_now` fails.
pub trait SchedulerModule: std::fmt::Debug + Send + Sync {
    fn get_name(&self) -> &str;

    /// `resources` is the requested set with all attachments already expanded.
    fn may_allocate(&self, client: &ClientId, resources: &ResourceSet, pool: &ReservationPool) -> bool;
}

/// Lets at most one client occupy the members of a block at any time.
#[derive(Debug, Clone)]
pub struct SingleVehicleBlockModule {
    blocks: Vec<Block>,
}

impl SingleVehicleBlockModule {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn from_plant_model(plant_model: &ResourceStore) -> Self {
        Self::new(plant_model.get_blocks())
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl SchedulerModule for SingleVehicleBlockModule {
    fn get_name(&self) -> &str {
        "SingleVehicleBlock"
    }

    fn may_allocate(&self, client: &ClientId, resources: &ResourceSet, pool: &ReservationPool) -> bool {
        for block in self.blocks.iter().filter(|block| block.overlaps(resources)) {
            if let Some(occupant) = block.members.iter().filter_map(|member| pool.get_holder(member)).find(|holder| *holder != client) {
                log::debug!("Block {} is occupied by {}, client {} has to wait.", block.id, occupant, client);
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::resource::Resource;

    fn set(names: &[&str]) -> ResourceSet {
        names.iter().copied().collect()
    }

    #[test]
    fn block_admits_only_one_client() {
        let store = ResourceStore::new();
        for name in ["Point-1", "Point-2", "Point-3"] {
            store.add(Resource::point(name)).unwrap();
        }
        store.add_block(Block::new("Crossing", set(&["Point-1", "Point-2"]))).unwrap();

        let module = SingleVehicleBlockModule::from_plant_model(&store);
        let mut pool = ReservationPool::new(store, false);
        let a = ClientId::new("Vehicle-01");
        let b = ClientId::new("Vehicle-02");

        assert!(module.may_allocate(&b, &set(&["Point-2"]), &pool));

        pool.allocate(&a, &set(&["Point-1"])).unwrap();
        assert!(module.may_allocate(&a, &set(&["Point-2"]), &pool));
        assert!(!module.may_allocate(&b, &set(&["Point-2"]), &pool));
        assert!(module.may_allocate(&b, &set(&["Point-3"]), &pool));
    }
}
