use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::utils::id::{BlockId, ResourceName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Point,
    Path,
    Location,
}

/// A named unit of plant space that can be held by exactly one client.
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: ResourceName,
    pub kind: ResourceKind,

    /// Resources that must always be held together with this one (e.g. the
    /// footprint a point physically overlaps).
    pub attached: ResourceSet,
}

impl Resource {
    pub fn new(name: impl Into<ResourceName>, kind: ResourceKind) -> Self {
        Self { name: name.into(), kind, attached: ResourceSet::new() }
    }

    pub fn point(name: &str) -> Self {
        Self::new(name, ResourceKind::Point)
    }

    pub fn path(name: &str) -> Self {
        Self::new(name, ResourceKind::Path)
    }

    pub fn location(name: &str) -> Self {
        Self::new(name, ResourceKind::Location)
    }

    pub fn with_attached(mut self, attached: &[&str]) -> Self {
        for name in attached {
            self.attached.insert(ResourceName::new(*name));
        }
        self
    }

    pub fn get_name(&self) -> ResourceName {
        self.name.clone()
    }
}

/// A group of resources that only one client may occupy at a time, no matter
/// which member it holds.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub members: ResourceSet,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, members: ResourceSet) -> Self {
        Self { id: id.into(), members }
    }

    pub fn overlaps(&self, resources: &ResourceSet) -> bool {
        !self.members.is_disjoint(resources)
    }
}
