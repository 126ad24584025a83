use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, mpsc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::domain::reservation::pending_allocation::PendingAllocation;
use crate::domain::resource::resource_set::ResourceSet;
use crate::domain::resource::resource_store::ResourceStore;
use crate::domain::scheduler::allocation_arbiter::AllocationArbiter;
use crate::domain::scheduler::deferred_request_manager::DeferredRequestManager;
use crate::domain::scheduler::scheduler_client::SharedClient;
use crate::domain::scheduler::scheduler_config::SchedulerConfig;
use crate::domain::scheduler::scheduler_message::SchedulerMessage;
use crate::domain::scheduler::scheduler_module::{SchedulerModule, SingleVehicleBlockModule};
use crate::domain::scheduler::task_handle::TaskHandle;
use crate::domain::utils::id::{ClientId, ResourceName};
use crate::error::{Error, Result};

#[derive(Debug)]
struct ControlThread {
    /// Distinguishes this run from earlier ones after a restart.
    generation: u64,
    tx: mpsc::Sender<SchedulerMessage>,
    handle: thread::JoinHandle<()>,
}

/// Public entry point for everything that claims, allocates or frees plant resources.
///
/// All requests are forwarded to one control thread that owns the claims and
/// allocations of every client, so no two clients can ever be granted the same
/// resource. The handle itself is `Sync` and meant to be shared through an `Arc`.
#[derive(Debug)]
pub struct Scheduler {
    plant_model: ResourceStore,
    config: SchedulerConfig,
    modules: Vec<Arc<dyn SchedulerModule>>,
    deferred: DeferredRequestManager,
    control: Mutex<Option<ControlThread>>,
    generation: AtomicU64,
}

impl Scheduler {
    /// Creates a stopped scheduler for the given plant model.
    ///
    /// If the plant model defines blocks, a `SingleVehicleBlockModule` is installed.
    pub fn new(plant_model: ResourceStore, config: SchedulerConfig) -> Self {
        let mut modules: Vec<Arc<dyn SchedulerModule>> = Vec::new();
        let block_module = SingleVehicleBlockModule::from_plant_model(&plant_model);
        if !block_module.is_empty() {
            modules.push(Arc::new(block_module));
        }

        Self { plant_model, config, modules, deferred: DeferredRequestManager::new(), control: Mutex::new(None), generation: AtomicU64::new(0) }
    }

    /// Adds an allocation rule. Takes effect with the next `initialize`.
    pub fn with_module(mut self, module: Arc<dyn SchedulerModule>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn get_plant_model(&self) -> &ResourceStore {
        &self.plant_model
    }

    pub fn get_config(&self) -> &SchedulerConfig {
        &self.config
    }

    //-------------------
    // --- Lifecycle ---
    //-------------------

    /// Starts the control thread with empty claims and allocations.
    pub fn initialize(&self) -> Result<()> {
        let mut guard = self.lock_control();
        if guard.is_some() {
            return Err(Error::SchedulerAlreadyRunning);
        }

        self.deferred.clear_all();
        let arbiter = AllocationArbiter::new(self.plant_model.clone(), self.deferred.clone(), self.modules.clone(), self.config.clone());
        let (tx, rx) = mpsc::channel::<SchedulerMessage>();

        let handle = thread::Builder::new().name("scheduler-control".to_string()).spawn(move || {
            Self::run_control_loop(arbiter, rx);
        })?;

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        *guard = Some(ControlThread { generation, tx, handle });
        log::info!("Scheduler initialized with {} resources and {} module(s).", self.plant_model.get_num_of_resources(), self.modules.len());
        Ok(())
    }

    /// Stops the control thread and cancels all outstanding allocation attempts.
    pub fn terminate(&self) -> Result<()> {
        let control = self.lock_control().take().ok_or(Error::SchedulerNotRunning)?;

        let _ = control.tx.send(SchedulerMessage::Shutdown);
        self.reap(control);
        log::info!("Scheduler terminated.");
        Ok(())
    }

    /// False once the control loop has stopped, also if it died on a panic.
    pub fn is_running(&self) -> bool {
        self.lock_control().is_some()
    }

    //---------------------------
    // --- Client Operations ---
    //---------------------------

    /// Replaces the client's claim with the given route, one resource set per step.
    pub fn claim(&self, client_id: &ClientId, resource_sets: Vec<ResourceSet>) -> Result<()> {
        let client_id = client_id.clone();
        self.call(|reply_to| SchedulerMessage::Claim { client_id, resource_sets, reply_to })?
    }

    /// Removes a not yet allocated set from the client's claim.
    pub fn unclaim(&self, client_id: &ClientId, resources: ResourceSet) -> Result<()> {
        let client_id = client_id.clone();
        self.call(|reply_to| SchedulerMessage::Unclaim { client_id, resources, reply_to })?
    }

    /// Requests the next set of the client's claim.
    ///
    /// Returns as soon as the request is queued. The client learns the outcome
    /// through `allocation_successful` or `allocation_failed`; a request for busy
    /// resources stays pending until they are freed.
    pub fn allocate(&self, client: SharedClient, resources: ResourceSet) -> Result<()> {
        let (tx, generation) = self.sender()?;
        let task = TaskHandle::new();
        self.deferred.register_task(&client.get_id(), task.clone());

        if tx.send(SchedulerMessage::Allocate(PendingAllocation::new(client, resources, task.clone()))).is_err() {
            task.cancel();
            return Err(self.control_lost(generation));
        }
        Ok(())
    }

    /// Allocates the set synchronously, ignoring the claim. Fails if anything is busy.
    pub fn allocate_now(&self, client_id: &ClientId, resources: ResourceSet) -> Result<ResourceSet> {
        let client_id = client_id.clone();
        self.call(|reply_to| SchedulerMessage::AllocateNow { client_id, resources, reply_to })?
    }

    /// Releases the set and retries all deferred requests.
    ///
    /// # Returns
    /// Returns the resources that were released, attachments included.
    pub fn free(&self, client_id: &ClientId, resources: ResourceSet) -> Result<ResourceSet> {
        let client_id = client_id.clone();
        self.call(|reply_to| SchedulerMessage::Free { client_id, resources, reply_to })?
    }

    /// Tears a client down: cancels its pending requests, drops its claim and
    /// releases everything it holds. Safe to call repeatedly.
    pub fn free_all(&self, client_id: &ClientId) -> Result<ResourceSet> {
        // Cancel first so attempts still travelling to the control thread are dropped there.
        self.deferred.clear_for(client_id);
        let client_id = client_id.clone();
        self.call(|reply_to| SchedulerMessage::FreeAll { client_id, reply_to })
    }

    /// Cancels the client's pending allocation requests but keeps what it holds.
    pub fn clear_pending_allocations(&self, client_id: &ClientId) -> Result<usize> {
        let cancelled = self.deferred.clear_for(client_id);
        let client_id = client_id.clone();
        Ok(cancelled + self.call(|reply_to| SchedulerMessage::ClearPendingAllocations { client_id, reply_to })?)
    }

    /// Triggers a retry of all deferred requests without freeing anything.
    pub fn reschedule(&self) -> Result<()> {
        let (tx, generation) = self.sender()?;
        tx.send(SchedulerMessage::Reschedule).map_err(|_| self.control_lost(generation))
    }

    /// Drops every claim, allocation and pending request, e.g. after the plant model was reloaded.
    pub fn clear(&self) -> Result<()> {
        self.call(SchedulerMessage::Clear)
    }

    //---------------------
    // --- Diagnostics ---
    //---------------------
    pub fn get_allocations(&self) -> Result<HashMap<ResourceName, ClientId>> {
        self.call(SchedulerMessage::GetAllocations)
    }

    pub fn allocated_resources(&self, client_id: &ClientId) -> Result<ResourceSet> {
        let client_id = client_id.clone();
        self.call(|reply_to| SchedulerMessage::GetAllocatedResources { client_id, reply_to })
    }

    pub fn get_claim(&self, client_id: &ClientId) -> Result<Vec<ResourceSet>> {
        let client_id = client_id.clone();
        self.call(|reply_to| SchedulerMessage::GetClaim { client_id, reply_to })
    }

    /// Unfinished allocation attempts per client.
    pub fn count_in_flight(&self) -> HashMap<ClientId, usize> {
        self.deferred.count_in_flight()
    }

    /// Locks the control slot, reaping a control thread that has already exited.
    fn lock_control(&self) -> MutexGuard<'_, Option<ControlThread>> {
        let mut guard = self.control.lock().expect("Mutex poisoned");
        if guard.as_ref().is_some_and(|control| control.handle.is_finished()) {
            if let Some(control) = guard.take() {
                self.reap(control);
            }
        }
        guard
    }

    fn sender(&self) -> Result<(mpsc::Sender<SchedulerMessage>, u64)> {
        let guard = self.lock_control();
        guard.as_ref().map(|control| (control.tx.clone(), control.generation)).ok_or(Error::SchedulerNotRunning)
    }

    /// The control loop of `generation` dropped its end of a channel, so it has
    /// stopped or is unwinding. Clears it from the slot unless a newer run took over.
    fn control_lost(&self, generation: u64) -> Error {
        let mut guard = self.control.lock().expect("Mutex poisoned");
        if guard.as_ref().is_some_and(|control| control.generation == generation) {
            if let Some(control) = guard.take() {
                self.reap(control);
            }
        }
        Error::SchedulerNotRunning
    }

    fn reap(&self, control: ControlThread) {
        if control.handle.join().is_err() {
            log::error!("Scheduler control thread terminated by panic.");
        }
        self.deferred.clear_all();
    }

    /// Sends a request to the control thread and blocks until it answered.
    fn call<R, F>(&self, msg_builder: F) -> Result<R>
    where
        F: FnOnce(mpsc::Sender<R>) -> SchedulerMessage,
    {
        let (tx, generation) = self.sender()?;
        let (reply_tx, reply_rx) = mpsc::channel();

        tx.send(msg_builder(reply_tx)).map_err(|_| self.control_lost(generation))?;
        reply_rx.recv().map_err(|_| self.control_lost(generation))
    }

    fn run_control_loop(mut arbiter: AllocationArbiter, rx: mpsc::Receiver<SchedulerMessage>) {
        log::info!("Scheduler control loop started.");

        while let Ok(msg) = rx.recv() {
            match msg {
                SchedulerMessage::Claim { client_id, resource_sets, reply_to } => {
                    let _ = reply_to.send(arbiter.claim(&client_id, resource_sets));
                }
                SchedulerMessage::Unclaim { client_id, resources, reply_to } => {
                    let _ = reply_to.send(arbiter.unclaim(&client_id, &resources));
                }
                SchedulerMessage::Allocate(request) => {
                    arbiter.allocate(request);
                }
                SchedulerMessage::AllocateNow { client_id, resources, reply_to } => {
                    let _ = reply_to.send(arbiter.allocate_now(&client_id, &resources));
                }
                SchedulerMessage::Free { client_id, resources, reply_to } => {
                    let _ = reply_to.send(arbiter.free(&client_id, &resources));
                }
                SchedulerMessage::FreeAll { client_id, reply_to } => {
                    let _ = reply_to.send(arbiter.free_all(&client_id));
                }
                SchedulerMessage::ClearPendingAllocations { client_id, reply_to } => {
                    let _ = reply_to.send(arbiter.clear_pending_allocations(&client_id));
                }
                SchedulerMessage::GetAllocations(reply_to) => {
                    let _ = reply_to.send(arbiter.get_allocations());
                }
                SchedulerMessage::GetAllocatedResources { client_id, reply_to } => {
                    let _ = reply_to.send(arbiter.allocated_resources(&client_id));
                }
                SchedulerMessage::GetClaim { client_id, reply_to } => {
                    let _ = reply_to.send(arbiter.get_claim(&client_id));
                }
                SchedulerMessage::Reschedule => arbiter.retry_deferred(),
                SchedulerMessage::Clear(reply_to) => {
                    arbiter.clear();
                    let _ = reply_to.send(());
                }
                SchedulerMessage::Shutdown => break,
            }
        }

        log::info!("Scheduler control loop stopped.");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.terminate();
        }
    }
}
