use std::collections::HashMap;

use crate::domain::utils::id::{ClientId, ResourceName};
use crate::error::{Error, Result};

/// Allocation state of one plant resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationEntry {
    holder: Option<ClientId>,
}

impl ReservationEntry {
    pub fn new() -> Self {
        Self { holder: None }
    }

    pub fn get_holder(&self) -> Option<&ClientId> {
        self.holder.as_ref()
    }

    pub fn is_free(&self) -> bool {
        self.holder.is_none()
    }

    /// True if the resource is free or already held by `client`.
    pub fn is_available_for(&self, client: &ClientId) -> bool {
        match &self.holder {
            Some(holder) => holder == client,
            None => true,
        }
    }
}

/// Single source of truth for who holds which resource right now.
///
/// Entries are created lazily; a resource that was never touched is free.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: HashMap<ResourceName, ReservationEntry>,
    strict_free: bool,
}

impl ResourceRegistry {
    pub fn new(strict_free: bool) -> Self {
        Self { entries: HashMap::new(), strict_free }
    }

    pub fn entry_for(&mut self, resource: &ResourceName) -> &mut ReservationEntry {
        self.entries.entry(resource.clone()).or_default()
    }

    pub fn get(&self, resource: &ResourceName) -> Option<&ReservationEntry> {
        self.entries.get(resource)
    }

    pub fn is_strict(&self) -> bool {
        self.strict_free
    }

    pub fn is_available_for(&self, resource: &ResourceName, client: &ClientId) -> bool {
        self.entries.get(resource).is_none_or(|entry| entry.is_available_for(client))
    }

    pub fn is_held_by(&self, resource: &ResourceName, client: &ClientId) -> bool {
        self.entries.get(resource).and_then(|entry| entry.get_holder()) == Some(client)
    }

    /// Marks the resource as held by `client`.
    ///
    /// The caller has already checked availability under the scheduler's
    /// serialization, so a resource held by someone else here means the
    /// serialization is broken.
    pub fn allocate(&mut self, resource: &ResourceName, client: &ClientId) {
        let entry = self.entry_for(resource);
        if let Some(holder) = &entry.holder {
            if holder != client {
                panic!("Resource {} is held by {} but was granted to {}. Allocation serialization is broken.", resource, holder, client);
            }
        }
        entry.holder = Some(client.clone());
    }

    /// Clears the holder of the resource if it is `client`.
    ///
    /// # Returns
    /// Returns `Ok(true)` if the resource was released. If `client` did not hold it,
    /// strict registries return `NotAllocated`, lenient ones log and return `Ok(false)`.
    pub fn free(&mut self, resource: &ResourceName, client: &ClientId) -> Result<bool> {
        let entry = self.entry_for(resource);
        if entry.holder.as_ref() == Some(client) {
            entry.holder = None;
            return Ok(true);
        }

        if self.strict_free {
            return Err(Error::NotAllocated { client: client.clone(), resource: resource.clone() });
        }
        log::warn!("Client {} freed resource {} which it did not hold. Ignored.", client, resource);
        Ok(false)
    }

    /// Snapshot of every held resource and its holder.
    pub fn get_allocations(&self) -> HashMap<ResourceName, ClientId> {
        self.entries.iter().filter_map(|(name, entry)| entry.holder.as_ref().map(|holder| (name.clone(), holder.clone()))).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
