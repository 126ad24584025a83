use std::collections::BTreeSet;
use std::collections::btree_set;
use std::fmt;

use crate::domain::utils::id::ResourceName;

/// An unordered set of plant resources requested or held as one unit.
///
/// Equality is set equality, so `{Point-A, Path-A-B}` equals `{Path-A-B, Point-A}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceSet {
    inner: BTreeSet<ResourceName>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self { inner: BTreeSet::new() }
    }

    pub fn insert(&mut self, resource: ResourceName) -> bool {
        self.inner.insert(resource)
    }

    pub fn remove(&mut self, resource: &ResourceName) -> bool {
        self.inner.remove(resource)
    }

    pub fn contains(&self, resource: &ResourceName) -> bool {
        self.inner.contains(resource)
    }

    pub fn extend(&mut self, other: &ResourceSet) {
        self.inner.extend(other.inner.iter().cloned());
    }

    pub fn is_disjoint(&self, other: &ResourceSet) -> bool {
        self.inner.is_disjoint(&other.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, ResourceName> {
        self.inner.iter()
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a ResourceName;
    type IntoIter = btree_set::Iter<'a, ResourceName>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl IntoIterator for ResourceSet {
    type Item = ResourceName;
    type IntoIter = btree_set::IntoIter<ResourceName>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl FromIterator<ResourceName> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceName>>(iter: I) -> Self {
        Self { inner: iter.into_iter().collect() }
    }
}

impl<'a> FromIterator<&'a str> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self { inner: iter.into_iter().map(ResourceName::new).collect() }
    }
}

impl fmt::Display for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.inner.iter().map(|name| name.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_insertion_order() {
        let a: ResourceSet = ["Point-A", "Path-A-B"].into_iter().collect();
        let b: ResourceSet = ["Path-A-B", "Point-A"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{Path-A-B, Point-A}");
    }

    #[test]
    fn duplicates_collapse() {
        let set: ResourceSet = ["Point-A", "Point-A"].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
