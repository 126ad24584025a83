use std::collections::{HashMap, VecDeque};

use crate::domain::reservation::reservation_entry::ResourceRegistry;
use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::resource::resource_store::ResourceStore;
use crate::domain::utils::id::{ClientId, ResourceName};
use crate::error::{Error, Result};

/// Claim and allocation bookkeeping for all clients.
///
/// The pool does not synchronize itself. It is owned by the scheduler's control
/// loop, which is the only place it is ever mutated.
#[derive(Debug)]
pub struct ReservationPool {
    plant_model: ResourceStore,
    registry: ResourceRegistry,

    /// Remaining (not yet allocated) resource sets per client, head first.
    claims: HashMap<ClientId, VecDeque<ResourceSet>>,

    /// Everything a client currently holds, attachments included.
    allocations: HashMap<ClientId, ResourceSet>,
}

impl ReservationPool {
    pub fn new(plant_model: ResourceStore, strict_free: bool) -> Self {
        Self { plant_model, registry: ResourceRegistry::new(strict_free), claims: HashMap::new(), allocations: HashMap::new() }
    }

    pub fn get_plant_model(&self) -> &ResourceStore {
        &self.plant_model
    }

    //----------------------
    // --- Claim Methods ---
    //----------------------
    pub fn set_claim(&mut self, client: &ClientId, resource_sets: Vec<ResourceSet>) {
        if resource_sets.is_empty() {
            self.claims.remove(client);
        } else {
            self.claims.insert(client.clone(), resource_sets.into());
        }
    }

    pub fn get_claim(&self, client: &ClientId) -> Vec<ResourceSet> {
        self.claims.get(client).map(|claim| claim.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn is_next_in_claim(&self, client: &ClientId, resources: &ResourceSet) -> bool {
        self.claims.get(client).and_then(|claim| claim.front()).is_some_and(|head| head == resources)
    }

    pub fn advance_claim(&mut self, client: &ClientId) {
        if let Some(claim) = self.claims.get_mut(client) {
            claim.pop_front();
            if claim.is_empty() {
                self.claims.remove(client);
            }
        }
    }

    /// Removes a not yet allocated resource set from anywhere in the client's claim.
    pub fn unclaim(&mut self, client: &ClientId, resources: &ResourceSet) -> Result<()> {
        let claim = self.claims.get_mut(client).ok_or_else(|| Error::InvalidArgument(format!("Client {} has no claim.", client)))?;

        let position = claim
            .iter()
            .position(|claimed| claimed == resources)
            .ok_or_else(|| Error::InvalidArgument(format!("Resources {} were not claimed by client {}.", resources, client)))?;

        claim.remove(position);
        if claim.is_empty() {
            self.claims.remove(client);
        }
        Ok(())
    }

    pub fn clear_claim(&mut self, client: &ClientId) {
        self.claims.remove(client);
    }

    //---------------------------
    // --- Allocation Methods ---
    //---------------------------

    /// True if every resource of the set, attachments included, is free or
    /// already held by `client`.
    pub fn resources_available(&self, client: &ClientId, resources: &ResourceSet) -> Result<bool> {
        let closure = self.plant_model.expand_attached(resources)?;
        Ok(closure.iter().all(|resource| self.registry.is_available_for(resource, client)))
    }

    /// Marks the set and all its attachments as held by `client`.
    ///
    /// Availability must have been checked by the caller.
    ///
    /// # Returns
    /// Returns the expanded set that is now held.
    pub fn allocate(&mut self, client: &ClientId, resources: &ResourceSet) -> Result<ResourceSet> {
        let closure = self.plant_model.expand_attached(resources)?;

        for resource in &closure {
            self.registry.allocate(resource, client);
        }
        self.allocations.entry(client.clone()).or_default().extend(&closure);

        Ok(closure)
    }

    /// Releases the set and all its attachments, as far as they are held by `client`.
    ///
    /// Resources that are still attached to something else the client holds stay
    /// allocated, so a point and its attachments never end up with different
    /// holders. Freeing such an attachment explicitly is refused in strict mode
    /// and ignored with a warning otherwise.
    ///
    /// # Returns
    /// Returns the resources that were actually released.
    pub fn free(&mut self, client: &ClientId, resources: &ResourceSet) -> Result<ResourceSet> {
        let closure = self.plant_model.expand_attached(resources)?;
        let strict = self.registry.is_strict();

        if strict {
            if let Some(not_held) = closure.iter().find(|resource| !self.registry.is_held_by(resource, client)) {
                return Err(Error::NotAllocated { client: client.clone(), resource: not_held.clone() });
            }
        }

        let remaining: ResourceSet = self.allocated_resources(client).into_iter().filter(|resource| !closure.contains(resource)).collect();
        let still_attached = self.plant_model.expand_attached(&remaining)?;

        if let Some(pinned) = resources.iter().find(|resource| still_attached.contains(resource)) {
            if strict {
                return Err(Error::InvalidArgument(format!(
                    "Resource {} cannot be freed by client {} while a resource it is attached to is still held.",
                    pinned, client
                )));
            }
            log::warn!("Client {} freed {} which is still attached to one of its held resources. Kept.", client, pinned);
        }

        let mut released = ResourceSet::new();
        for resource in closure.iter().filter(|resource| !still_attached.contains(resource)) {
            if self.registry.free(resource, client)? {
                released.insert(resource.clone());
            }
        }
        self.forget_allocated(client, &released);

        Ok(released)
    }

    /// Releases everything `client` holds.
    pub fn free_all(&mut self, client: &ClientId) -> ResourceSet {
        let held = self.allocations.remove(client).unwrap_or_default();
        for resource in &held {
            match self.registry.free(resource, client) {
                Ok(true) => {}
                _ => panic!("Resource {} is recorded as held by {} but the registry disagrees.", resource, client),
            }
        }
        held
    }

    pub fn allocated_resources(&self, client: &ClientId) -> ResourceSet {
        self.allocations.get(client).cloned().unwrap_or_default()
    }

    pub fn get_holder(&self, resource: &ResourceName) -> Option<&ClientId> {
        self.registry.get(resource).and_then(|entry| entry.get_holder())
    }

    pub fn get_allocations(&self) -> HashMap<ResourceName, ClientId> {
        self.registry.get_allocations()
    }

    pub fn clear(&mut self) {
        self.registry.clear();
        self.claims.clear();
        self.allocations.clear();
    }

    fn forget_allocated(&mut self, client: &ClientId, released: &ResourceSet) {
        if let Some(held) = self.allocations.get_mut(client) {
            for resource in released {
                held.remove(resource);
            }
            if held.is_empty() {
                self.allocations.remove(client);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::resource::Resource;

    fn set(names: &[&str]) -> ResourceSet {
        names.iter().copied().collect()
    }

    fn plant_model() -> ResourceStore {
        let store = ResourceStore::new();
        store.add(Resource::point("Point-1").with_attached(&["Footprint-1"])).unwrap();
        store.add(Resource::location("Footprint-1")).unwrap();
        store.add(Resource::point("Point-2")).unwrap();
        store.add(Resource::path("Path-1-2")).unwrap();
        store.add(Resource::point("Point-3")).unwrap();
        store.add(Resource::point("Point-4").with_attached(&["Footprint-1"])).unwrap();
        store
    }

    #[test]
    fn claim_is_consumed_from_the_front() {
        let mut pool = ReservationPool::new(plant_model(), false);
        let client = ClientId::new("Vehicle-01");
        pool.set_claim(&client, vec![set(&["Point-1"]), set(&["Path-1-2", "Point-2"])]);

        assert!(pool.is_next_in_claim(&client, &set(&["Point-1"])));
        assert!(!pool.is_next_in_claim(&client, &set(&["Point-2", "Path-1-2"])));

        pool.advance_claim(&client);
        assert!(pool.is_next_in_claim(&client, &set(&["Point-2", "Path-1-2"])));

        pool.advance_claim(&client);
        assert!(pool.get_claim(&client).is_empty());
        assert!(!pool.is_next_in_claim(&client, &set(&["Point-1"])));
    }

    #[test]
    fn unclaim_removes_from_anywhere_and_rejects_unknown_sets() {
        let mut pool = ReservationPool::new(plant_model(), false);
        let client = ClientId::new("Vehicle-01");
        pool.set_claim(&client, vec![set(&["Point-1"]), set(&["Point-2"]), set(&["Point-3"])]);

        pool.unclaim(&client, &set(&["Point-2"])).unwrap();
        assert_eq!(pool.get_claim(&client), vec![set(&["Point-1"]), set(&["Point-3"])]);

        assert!(matches!(pool.unclaim(&client, &set(&["Point-2"])), Err(Error::InvalidArgument(_))));
        assert!(matches!(pool.unclaim(&ClientId::new("Vehicle-02"), &set(&["Point-1"])), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn allocation_includes_attached_resources() {
        let mut pool = ReservationPool::new(plant_model(), false);
        let a = ClientId::new("Vehicle-01");
        let b = ClientId::new("Vehicle-02");

        let held = pool.allocate(&a, &set(&["Point-1"])).unwrap();
        assert_eq!(held, set(&["Point-1", "Footprint-1"]));
        assert_eq!(pool.get_allocations().get(&ResourceName::new("Footprint-1")), Some(&a));

        assert!(pool.resources_available(&a, &set(&["Point-1", "Point-2"])).unwrap());
        assert!(!pool.resources_available(&b, &set(&["Point-1"])).unwrap());

        let released = pool.free(&a, &set(&["Point-1"])).unwrap();
        assert_eq!(released, set(&["Point-1", "Footprint-1"]));
        assert!(pool.get_allocations().is_empty());
        assert!(pool.allocated_resources(&a).is_empty());
    }

    #[test]
    fn shared_attachment_stays_held_while_still_needed() {
        let mut pool = ReservationPool::new(plant_model(), false);
        let a = ClientId::new("Vehicle-01");
        let b = ClientId::new("Vehicle-02");
        pool.allocate(&a, &set(&["Point-1"])).unwrap();
        pool.allocate(&a, &set(&["Point-4"])).unwrap();

        let released = pool.free(&a, &set(&["Point-1"])).unwrap();
        assert_eq!(released, set(&["Point-1"]));
        assert_eq!(pool.get_holder(&ResourceName::new("Footprint-1")), Some(&a));
        assert!(!pool.resources_available(&b, &set(&["Footprint-1"])).unwrap());

        let released = pool.free(&a, &set(&["Point-4"])).unwrap();
        assert_eq!(released, set(&["Point-4", "Footprint-1"]));
        assert!(pool.get_allocations().is_empty());
    }

    #[test]
    fn attachment_of_a_held_point_is_not_freed_alone() {
        let a = ClientId::new("Vehicle-01");

        let mut lenient = ReservationPool::new(plant_model(), false);
        lenient.allocate(&a, &set(&["Point-1"])).unwrap();
        assert!(lenient.free(&a, &set(&["Footprint-1"])).unwrap().is_empty());
        assert_eq!(lenient.allocated_resources(&a), set(&["Point-1", "Footprint-1"]));

        let mut strict = ReservationPool::new(plant_model(), true);
        strict.allocate(&a, &set(&["Point-1"])).unwrap();
        assert!(matches!(strict.free(&a, &set(&["Footprint-1"])), Err(Error::InvalidArgument(_))));
        assert_eq!(strict.allocated_resources(&a), set(&["Point-1", "Footprint-1"]));

        // Freeing the point together with its attachment is fine.
        assert_eq!(strict.free(&a, &set(&["Point-1", "Footprint-1"])).unwrap().len(), 2);
    }

    #[test]
    fn free_only_releases_what_the_client_holds() {
        let mut pool = ReservationPool::new(plant_model(), false);
        let a = ClientId::new("Vehicle-01");
        let b = ClientId::new("Vehicle-02");
        pool.allocate(&a, &set(&["Point-2"])).unwrap();

        let released = pool.free(&b, &set(&["Point-2"])).unwrap();
        assert!(released.is_empty());
        assert_eq!(pool.get_allocations().get(&ResourceName::new("Point-2")), Some(&a));
    }

    #[test]
    fn strict_free_fails_without_side_effects() {
        let mut pool = ReservationPool::new(plant_model(), true);
        let a = ClientId::new("Vehicle-01");
        pool.allocate(&a, &set(&["Point-2"])).unwrap();

        assert!(matches!(pool.free(&a, &set(&["Point-2", "Point-3"])), Err(Error::NotAllocated { .. })));
        assert_eq!(pool.allocated_resources(&a), set(&["Point-2"]));
    }

    #[test]
    fn free_all_is_idempotent() {
        let mut pool = ReservationPool::new(plant_model(), false);
        let a = ClientId::new("Vehicle-01");
        pool.allocate(&a, &set(&["Point-1"])).unwrap();
        pool.allocate(&a, &set(&["Path-1-2", "Point-2"])).unwrap();

        assert_eq!(pool.free_all(&a).len(), 4);
        assert!(pool.free_all(&a).is_empty());
        assert!(pool.get_allocations().is_empty());
    }

    #[test]
    fn clear_resets_everything() {
        let mut pool = ReservationPool::new(plant_model(), false);
        let a = ClientId::new("Vehicle-01");
        pool.set_claim(&a, vec![set(&["Point-3"])]);
        pool.allocate(&a, &set(&["Point-2"])).unwrap();

        pool.clear();
        assert!(pool.get_allocations().is_empty());
        assert!(pool.get_claim(&a).is_empty());
    }
}
