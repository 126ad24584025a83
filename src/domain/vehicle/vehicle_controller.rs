use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::route::route::Route;
use crate::domain::scheduler::scheduler::Scheduler;
use crate::domain::scheduler::scheduler_client::SchedulerClient;
use crate::domain::utils::id::{ClientId, VehicleId};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationEvent {
    Granted(ResourceSet),
    Failed(ResourceSet),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// Every step of the route was allocated.
    Completed,

    /// The scheduler rejected a step.
    Rejected,

    /// A step was not granted in time and its request was withdrawn.
    Stalled,
}

#[derive(Debug, Clone)]
pub struct DriveReport {
    pub outcome: DriveOutcome,
    pub granted_steps: usize,
    pub total_steps: usize,

    /// The resources the vehicle still holds where it stopped.
    pub final_position: Option<ResourceSet>,
}

/// Scheduler client of a single vehicle.
///
/// Notifications are queued as `AllocationEvent`s so the vehicle's own thread
/// can wait for them.
#[derive(Debug)]
pub struct VehicleController {
    id: ClientId,
    vehicle: VehicleId,
    events_tx: mpsc::Sender<AllocationEvent>,
    events_rx: Mutex<mpsc::Receiver<AllocationEvent>>,
}

impl VehicleController {
    pub fn new(name: &str) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self { id: ClientId::new(name), vehicle: VehicleId::new(name), events_tx, events_rx: Mutex::new(events_rx) }
    }

    pub fn new_shared(name: &str) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    pub fn next_event(&self, timeout: Duration) -> Option<AllocationEvent> {
        self.events_rx.lock().expect("Mutex poisoned").recv_timeout(timeout).ok()
    }

    pub fn try_next_event(&self) -> Option<AllocationEvent> {
        self.events_rx.lock().expect("Mutex poisoned").try_recv().ok()
    }

    /// Claims the route and moves along it step by step: allocate the next step,
    /// wait for the grant, then free the step behind.
    ///
    /// The last granted step stays allocated, it is where the vehicle stands.
    pub fn drive_route(self: &Arc<Self>, scheduler: &Scheduler, route: &Route, step_timeout: Duration) -> Result<DriveReport> {
        let claim = route.to_claim();
        scheduler.claim(&self.id, claim.clone())?;

        let mut report = DriveReport { outcome: DriveOutcome::Completed, granted_steps: 0, total_steps: claim.len(), final_position: None };

        for resources in claim {
            scheduler.allocate(self.clone(), resources.clone())?;

            match self.next_event(step_timeout) {
                Some(AllocationEvent::Granted(granted)) if granted == resources => {
                    log::info!("Vehicle {} entered {}.", self.vehicle, granted);
                    if let Some(behind) = report.final_position.replace(granted) {
                        scheduler.free(&self.id, behind)?;
                    }
                    report.granted_steps += 1;
                }
                Some(AllocationEvent::Failed(rejected)) => {
                    log::warn!("Vehicle {} was refused {}.", self.vehicle, rejected);
                    report.outcome = DriveOutcome::Rejected;
                    break;
                }
                other => {
                    log::warn!("Vehicle {} waited too long for {} ({:?}). Withdrawing request.", self.vehicle, resources, other);
                    scheduler.clear_pending_allocations(&self.id)?;
                    report.outcome = DriveOutcome::Stalled;
                    break;
                }
            }
        }

        Ok(report)
    }
}

impl SchedulerClient for VehicleController {
    fn get_id(&self) -> ClientId {
        self.id.clone()
    }

    fn get_related_vehicle(&self) -> Option<VehicleId> {
        Some(self.vehicle.clone())
    }

    fn allocation_successful(&self, resources: &ResourceSet) {
        let _ = self.events_tx.send(AllocationEvent::Granted(resources.clone()));
    }

    fn allocation_failed(&self, resources: &ResourceSet) {
        let _ = self.events_tx.send(AllocationEvent::Failed(resources.clone()));
    }
}
