use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::utils::id::ResourceName;

/// One movement of a route: the path travelled (none for the start position)
/// and the point reached at its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStep {
    pub path: Option<ResourceName>,
    pub destination_point: ResourceName,
}

impl RouteStep {
    pub fn new(path: Option<&str>, destination_point: &str) -> Self {
        Self { path: path.map(ResourceName::new), destination_point: ResourceName::new(destination_point) }
    }

    pub fn get_resources(&self) -> ResourceSet {
        let mut resources = ResourceSet::new();
        if let Some(path) = &self.path {
            resources.insert(path.clone());
        }
        resources.insert(self.destination_point.clone());
        resources
    }
}

/// A computed route as handed over by the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub steps: Vec<RouteStep>,
}

impl Route {
    pub fn new(steps: Vec<RouteStep>) -> Self {
        Self { steps }
    }

    /// The claim for this route: one resource set per step, in driving order.
    pub fn to_claim(&self) -> Vec<ResourceSet> {
        self.steps.iter().map(RouteStep::get_resources).collect()
    }
}
