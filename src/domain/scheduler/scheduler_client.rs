use std::sync::Arc;

use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::utils::id::{ClientId, VehicleId};

/// Anything that claims, allocates and frees plant resources, usually the
/// controller of one vehicle.
///
/// Notifications are delivered on the scheduler's control thread. They must
/// return quickly and must not wait for a reply from the scheduler (`claim`,
/// `free`, `allocate_now`, ...), since the scheduler cannot answer while it is
/// still delivering the notification. Handing the event to another thread or
/// calling `Scheduler::allocate` is fine.
pub trait SchedulerClient: std::fmt::Debug + Send + Sync {
    fn get_id(&self) -> ClientId;

    /// The vehicle this client acts for, if any. Only used for diagnostics.
    fn get_related_vehicle(&self) -> Option<VehicleId>;

    /// Called exactly once for every granted `allocate` request.
    fn allocation_successful(&self, resources: &ResourceSet);

    /// Called exactly once for every `allocate` request rejected as a contract
    /// violation. Requests that are merely blocked are never reported here.
    fn allocation_failed(&self, resources: &ResourceSet);
}

pub type SharedClient = Arc<dyn SchedulerClient>;
