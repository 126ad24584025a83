use std::collections::HashMap;
use std::sync::mpsc;

use crate::domain::reservation::pending_allocation::PendingAllocation;
use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::utils::id::{ClientId, ResourceName};
use crate::error::Result;

/// One unit of work for the scheduler's control loop.
///
/// Every public scheduler operation is turned into one of these and handled
/// strictly in the order it was sent.
pub enum SchedulerMessage {
    Claim {
        client_id: ClientId,
        resource_sets: Vec<ResourceSet>,
        reply_to: mpsc::Sender<Result<()>>,
    },

    Unclaim {
        client_id: ClientId,
        resources: ResourceSet,
        reply_to: mpsc::Sender<Result<()>>,
    },

    /// Fire and forget; the outcome is reported to the client.
    Allocate(PendingAllocation),

    AllocateNow {
        client_id: ClientId,
        resources: ResourceSet,
        reply_to: mpsc::Sender<Result<ResourceSet>>,
    },

    Free {
        client_id: ClientId,
        resources: ResourceSet,
        reply_to: mpsc::Sender<Result<ResourceSet>>,
    },

    FreeAll {
        client_id: ClientId,
        reply_to: mpsc::Sender<ResourceSet>,
    },

    ClearPendingAllocations {
        client_id: ClientId,
        reply_to: mpsc::Sender<usize>,
    },

    GetAllocations(mpsc::Sender<HashMap<ResourceName, ClientId>>),

    GetAllocatedResources {
        client_id: ClientId,
        reply_to: mpsc::Sender<ResourceSet>,
    },

    GetClaim {
        client_id: ClientId,
        reply_to: mpsc::Sender<Vec<ResourceSet>>,
    },

    Reschedule,

    Clear(mpsc::Sender<()>),

    Shutdown,
}
