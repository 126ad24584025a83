use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use slotmap::{SlotMap, new_key_type};

use crate::domain::resource::resource::{Block, Resource, ResourceKind};
use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::utils::id::{BlockId, ResourceName};
use crate::error::{Error, Result};

new_key_type! {
    pub struct ResourceKey;
    pub struct BlockKey;
}

#[derive(Debug, Default)]
struct StoreInner {
    resources: SlotMap<ResourceKey, Resource>,
    blocks: SlotMap<BlockKey, Block>,

    /// Index lookup of the internal key by the plant model name.
    name_index: HashMap<ResourceName, ResourceKey>,
    block_index: HashMap<BlockId, BlockKey>,
}

/// The static plant model as seen by the scheduler: every addressable resource
/// with its attached resources, plus the blocks they belong to.
///
/// Cloning is cheap, all clones share the same model.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(StoreInner::default())) }
    }

    /// Adds a resource to the plant model.
    ///
    /// # Returns
    /// Returns the internal key, or `ModelConstructionError` if the name is already taken.
    pub fn add(&self, resource: Resource) -> Result<ResourceKey> {
        let mut guard = self.inner.write().expect("RwLock poisoned");
        if guard.name_index.contains_key(&resource.name) {
            return Err(Error::ModelConstructionError(format!("Duplicate resource name {}.", resource.name)));
        }

        let name = resource.get_name();
        let key = guard.resources.insert(resource);
        guard.name_index.insert(name, key);

        Ok(key)
    }

    pub fn add_block(&self, block: Block) -> Result<BlockKey> {
        let mut guard = self.inner.write().expect("RwLock poisoned");
        if guard.block_index.contains_key(&block.id) {
            return Err(Error::ModelConstructionError(format!("Duplicate block id {}.", block.id)));
        }
        if let Some(unknown) = block.members.iter().find(|member| !guard.name_index.contains_key(*member)) {
            return Err(Error::ModelConstructionError(format!("Block {} references unknown resource {}.", block.id, unknown)));
        }

        let id = block.id.clone();
        let key = guard.blocks.insert(block);
        guard.block_index.insert(id, key);

        Ok(key)
    }

    pub fn get_num_of_resources(&self) -> usize {
        let guard = self.inner.read().expect("RwLock poisoned");
        guard.resources.len()
    }

    pub fn count_by_kind(&self, kind: ResourceKind) -> usize {
        let guard = self.inner.read().expect("RwLock poisoned");
        guard.resources.values().filter(|resource| resource.kind == kind).count()
    }

    pub fn get_blocks(&self) -> Vec<Block> {
        let guard = self.inner.read().expect("RwLock poisoned");
        guard.blocks.values().cloned().collect()
    }

    /// Checks that every resource of the set is part of the plant model.
    pub fn validate(&self, resources: &ResourceSet) -> Result<()> {
        let guard = self.inner.read().expect("RwLock poisoned");
        match resources.iter().find(|name| !guard.name_index.contains_key(*name)) {
            Some(unknown) => Err(Error::UnknownResource(unknown.clone())),
            None => Ok(()),
        }
    }

    /// Expands the given set with all attached resources, transitively.
    ///
    /// The attachment relation may contain cycles; every resource is visited once.
    ///
    /// # Returns
    /// Returns the flat closure, or `UnknownResource` if any name is not part of the plant model.
    pub fn expand_attached(&self, resources: &ResourceSet) -> Result<ResourceSet> {
        let guard = self.inner.read().expect("RwLock poisoned");
        let mut closure = ResourceSet::new();
        let mut to_visit: VecDeque<ResourceName> = resources.iter().cloned().collect();

        while let Some(name) = to_visit.pop_front() {
            if closure.contains(&name) {
                continue;
            }

            let key = guard.name_index.get(&name).ok_or_else(|| Error::UnknownResource(name.clone()))?;
            let resource = &guard.resources[*key];

            to_visit.extend(resource.attached.iter().filter(|attached| !closure.contains(*attached)).cloned());
            closure.insert(name);
        }

        Ok(closure)
    }
}
