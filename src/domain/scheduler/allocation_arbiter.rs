use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::reservation::pending_allocation::PendingAllocation;
use crate::domain::reservation::reservation_pool::ReservationPool;
use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::resource::resource_store::ResourceStore;
use crate::domain::scheduler::deferred_request_manager::DeferredRequestManager;
use crate::domain::scheduler::scheduler_config::SchedulerConfig;
use crate::domain::scheduler::scheduler_module::SchedulerModule;
use crate::domain::utils::id::{ClientId, ResourceName};
use crate::error::{Error, Result};

/// Decides every claim, allocation and release.
///
/// The arbiter is owned by the scheduler's control thread; all of its methods run
/// there, one after another, which makes every multi-resource grant atomic with
/// respect to every other request in the system.
#[derive(Debug)]
pub struct AllocationArbiter {
    pool: ReservationPool,
    deferred: DeferredRequestManager,
    modules: Vec<Arc<dyn SchedulerModule>>,
    config: SchedulerConfig,
}

impl AllocationArbiter {
    pub fn new(
        plant_model: ResourceStore,
        deferred: DeferredRequestManager,
        modules: Vec<Arc<dyn SchedulerModule>>,
        config: SchedulerConfig,
    ) -> Self {
        let pool = ReservationPool::new(plant_model, config.strict_free);
        Self { pool, deferred, modules, config }
    }

    pub fn claim(&mut self, client: &ClientId, resource_sets: Vec<ResourceSet>) -> Result<()> {
        for resources in &resource_sets {
            self.pool.get_plant_model().validate(resources)?;
        }
        log::debug!("Client {} claimed {} resource set(s).", client, resource_sets.len());
        self.pool.set_claim(client, resource_sets);
        Ok(())
    }

    pub fn unclaim(&mut self, client: &ClientId, resources: &ResourceSet) -> Result<()> {
        self.pool.unclaim(client, resources)
    }

    /// Evaluates one allocation attempt: grant it, defer it, or reject it.
    pub fn allocate(&mut self, request: PendingAllocation) {
        if !request.task.begin() {
            log::debug!("Dropping cancelled allocation of {} for client {}.", request.resources, request.get_client_id());
            return;
        }

        let client = request.get_client_id();
        if !self.pool.is_next_in_claim(&client, &request.resources) {
            log::warn!("Client {} requested {} which is not the next entry of its claim. Rejected.", client, request.resources);
            request.task.complete();
            request.client.allocation_failed(&request.resources);
            return;
        }

        match self.try_grant(&client, &request.resources) {
            Ok(Some(_)) => {
                self.pool.advance_claim(&client);
                request.task.complete();
                log::debug!("Granted {} to client {}.", request.resources, client);
                request.client.allocation_successful(&request.resources);
            }
            Ok(None) => {
                if request.task.suspend() {
                    log::debug!("Resources {} are busy, deferring request of client {}.", request.resources, client);
                    self.deferred.enqueue(request);
                } else {
                    log::debug!("Allocation of {} for client {} was cancelled while being evaluated.", request.resources, client);
                }
            }
            Err(error) => {
                log::warn!("Allocation of {} for client {} failed: {}", request.resources, client, error);
                request.task.complete();
                request.client.allocation_failed(&request.resources);
            }
        }
    }

    /// Grants the set right away, bypassing claim order and the deferred queue.
    pub fn allocate_now(&mut self, client: &ClientId, resources: &ResourceSet) -> Result<ResourceSet> {
        self.pool.get_plant_model().validate(resources)?;

        match self.try_grant(client, resources)? {
            Some(granted) => {
                log::info!("Allocated {} to client {} immediately.", granted, client);
                Ok(granted)
            }
            None => Err(Error::ResourcesUnavailable { client: client.clone(), resources: resources.clone() }),
        }
    }

    pub fn free(&mut self, client: &ClientId, resources: &ResourceSet) -> Result<ResourceSet> {
        let released = self.pool.free(client, resources)?;
        log::debug!("Client {} released {}.", client, released);
        self.retry_deferred();
        Ok(released)
    }

    /// Tears down everything the client has: holdings, claim and pending work.
    pub fn free_all(&mut self, client: &ClientId) -> ResourceSet {
        self.deferred.clear_for(client);
        self.pool.clear_claim(client);
        let released = self.pool.free_all(client);
        if !released.is_empty() {
            log::info!("Released all resources of client {}: {}", client, released);
        }
        self.retry_deferred();
        released
    }

    pub fn clear_pending_allocations(&mut self, client: &ClientId) -> usize {
        self.deferred.clear_for(client)
    }

    /// Retries every deferred request once, in arrival order.
    ///
    /// Requests that are still blocked end up back in the queue in the same order.
    pub fn retry_deferred(&mut self) {
        let drained = self.deferred.drain_all();
        if drained.is_empty() {
            return;
        }

        log::debug!("Retrying {} deferred allocation request(s).", drained.len());
        for request in drained {
            self.allocate(request);
        }

        let remaining = self.deferred.get_queue_len();
        if remaining > self.config.deferred_queue_warn_threshold {
            log::warn!("{} allocation requests are still deferred after retry.", remaining);
        }
    }

    pub fn get_allocations(&self) -> HashMap<ResourceName, ClientId> {
        self.pool.get_allocations()
    }

    pub fn allocated_resources(&self, client: &ClientId) -> ResourceSet {
        self.pool.allocated_resources(client)
    }

    pub fn get_claim(&self, client: &ClientId) -> Vec<ResourceSet> {
        self.pool.get_claim(client)
    }

    pub fn clear(&mut self) {
        log::info!("Clearing all claims, allocations and deferred requests.");
        self.deferred.clear_all();
        self.pool.clear();
    }

    /// Allocates the set if all of its resources are available and no module objects.
    ///
    /// # Returns
    /// Returns the granted set with attachments, or None if the client has to wait.
    fn try_grant(&mut self, client: &ClientId, resources: &ResourceSet) -> Result<Option<ResourceSet>> {
        if !self.pool.resources_available(client, resources)? {
            return Ok(None);
        }

        let closure = self.pool.get_plant_model().expand_attached(resources)?;
        if let Some(module) = self.modules.iter().find(|module| !module.may_allocate(client, &closure, &self.pool)) {
            log::debug!("Module {} vetoed allocation of {} for client {}.", module.get_name(), resources, client);
            return Ok(None);
        }

        self.pool.allocate(client, resources).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::resource::Resource;
    use crate::domain::scheduler::scheduler_client::SchedulerClient;
    use crate::domain::scheduler::task_handle::TaskHandle;
    use crate::domain::vehicle::vehicle_controller::{AllocationEvent, VehicleController};

    fn set(names: &[&str]) -> ResourceSet {
        names.iter().copied().collect()
    }

    fn arbiter() -> (AllocationArbiter, DeferredRequestManager) {
        let store = ResourceStore::new();
        for name in ["Point-1", "Point-2", "Point-3"] {
            store.add(Resource::point(name)).unwrap();
        }
        let deferred = DeferredRequestManager::new();
        (AllocationArbiter::new(store, deferred.clone(), Vec::new(), SchedulerConfig::default()), deferred)
    }

    fn request(vehicle: &Arc<VehicleController>, resources: ResourceSet) -> PendingAllocation {
        PendingAllocation::new(vehicle.clone(), resources, TaskHandle::new())
    }

    #[test]
    fn blocked_requests_are_retried_in_arrival_order() {
        let (mut arbiter, deferred) = arbiter();
        let a = VehicleController::new_shared("Vehicle-A");
        let b = VehicleController::new_shared("Vehicle-B");
        let c = VehicleController::new_shared("Vehicle-C");

        arbiter.allocate_now(&a.get_id(), &set(&["Point-1", "Point-2"])).unwrap();
        arbiter.claim(&b.get_id(), vec![set(&["Point-1"])]).unwrap();
        arbiter.claim(&c.get_id(), vec![set(&["Point-1", "Point-2"])]).unwrap();

        arbiter.allocate(request(&b, set(&["Point-1"])));
        arbiter.allocate(request(&c, set(&["Point-1", "Point-2"])));
        assert_eq!(deferred.get_queue_len(), 2);

        arbiter.free(&a.get_id(), &set(&["Point-1"])).unwrap();
        assert_eq!(b.try_next_event(), Some(AllocationEvent::Granted(set(&["Point-1"]))));
        assert_eq!(c.try_next_event(), None);
        assert_eq!(deferred.get_queue_len(), 1);

        arbiter.free(&a.get_id(), &set(&["Point-2"])).unwrap();
        arbiter.free(&b.get_id(), &set(&["Point-1"])).unwrap();
        assert_eq!(c.try_next_event(), Some(AllocationEvent::Granted(set(&["Point-1", "Point-2"]))));
        assert_eq!(deferred.get_queue_len(), 0);
    }

    #[test]
    fn cancelled_request_is_dropped_on_retry() {
        let (mut arbiter, deferred) = arbiter();
        let a = VehicleController::new_shared("Vehicle-A");
        let b = VehicleController::new_shared("Vehicle-B");

        arbiter.allocate_now(&a.get_id(), &set(&["Point-1"])).unwrap();
        arbiter.claim(&b.get_id(), vec![set(&["Point-1"])]).unwrap();

        let pending = request(&b, set(&["Point-1"]));
        let task = pending.task.clone();
        arbiter.allocate(pending);
        assert!(task.cancel());

        arbiter.free(&a.get_id(), &set(&["Point-1"])).unwrap();
        assert_eq!(b.try_next_event(), None);
        assert_eq!(deferred.get_queue_len(), 0);
        assert!(arbiter.get_allocations().is_empty());
    }

    #[test]
    fn allocate_now_never_waits() {
        let (mut arbiter, _) = arbiter();
        let a = ClientId::new("Vehicle-A");
        let b = ClientId::new("Vehicle-B");

        arbiter.allocate_now(&a, &set(&["Point-3"])).unwrap();
        assert!(matches!(arbiter.allocate_now(&b, &set(&["Point-3"])), Err(Error::ResourcesUnavailable { .. })));
        assert!(matches!(arbiter.allocate_now(&b, &set(&["Point-9"])), Err(Error::UnknownResource(_))));
        assert!(arbiter.allocated_resources(&b).is_empty());
    }

    #[test]
    fn claim_with_unknown_resource_is_rejected() {
        let (mut arbiter, _) = arbiter();
        let a = ClientId::new("Vehicle-A");

        assert!(matches!(arbiter.claim(&a, vec![set(&["Point-1"]), set(&["Nowhere"])]), Err(Error::UnknownResource(_))));
        assert!(arbiter.get_claim(&a).is_empty());
    }
}
