use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::domain::reservation::pending_allocation::PendingAllocation;
use crate::domain::scheduler::task_handle::TaskHandle;
use crate::domain::utils::id::ClientId;

#[derive(Debug, Default)]
struct ManagerInner {
    /// Blocked requests in arrival order.
    queue: VecDeque<PendingAllocation>,

    /// Allocation attempts that were dispatched and may not have finished yet.
    tasks: HashMap<ClientId, Vec<TaskHandle>>,
}

/// Holds allocation requests that could not be granted immediately and the
/// handles of all attempts still in flight, so a client's work can be
/// cancelled when it goes away.
///
/// Shared between the scheduler façade, which registers attempts as it
/// dispatches them, and the control loop, which queues and retries them.
#[derive(Debug, Clone, Default)]
pub struct DeferredRequestManager {
    inner: Arc<Mutex<ManagerInner>>,
}

impl DeferredRequestManager {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(ManagerInner::default())) }
    }

    pub fn enqueue(&self, request: PendingAllocation) {
        let mut guard = self.inner.lock().expect("Mutex poisoned");
        guard.queue.push_back(request);
    }

    /// Removes and returns the whole queue, oldest request first.
    pub fn drain_all(&self) -> Vec<PendingAllocation> {
        let mut guard = self.inner.lock().expect("Mutex poisoned");
        guard.queue.drain(..).collect()
    }

    pub fn get_queue_len(&self) -> usize {
        let guard = self.inner.lock().expect("Mutex poisoned");
        guard.queue.len()
    }

    /// Records an attempt in flight for `client`, purging finished handles of all clients first.
    pub fn register_task(&self, client: &ClientId, task: TaskHandle) {
        let mut guard = self.inner.lock().expect("Mutex poisoned");
        Self::purge_done(&mut guard.tasks);
        guard.tasks.entry(client.clone()).or_default().push(task);
    }

    /// Number of unfinished attempts per client.
    pub fn count_in_flight(&self) -> HashMap<ClientId, usize> {
        let mut guard = self.inner.lock().expect("Mutex poisoned");
        Self::purge_done(&mut guard.tasks);
        guard.tasks.iter().map(|(client, tasks)| (client.clone(), tasks.len())).collect()
    }

    /// Drops all queued requests of `client` and cancels its unfinished attempts.
    ///
    /// # Returns
    /// Returns the number of attempts that were cancelled by this call.
    pub fn clear_for(&self, client: &ClientId) -> usize {
        let mut guard = self.inner.lock().expect("Mutex poisoned");
        guard.queue.retain(|request| &request.get_client_id() != client);

        let tasks = guard.tasks.remove(client).unwrap_or_default();
        let cancelled = tasks.iter().filter(|task| task.cancel()).count();
        if cancelled > 0 {
            log::debug!("Cancelled {} outstanding allocation attempt(s) of client {}.", cancelled, client);
        }
        cancelled
    }

    /// Cancels everything and empties the queue.
    pub fn clear_all(&self) {
        let mut guard = self.inner.lock().expect("Mutex poisoned");
        guard.queue.clear();
        for task in guard.tasks.values().flatten() {
            task.cancel();
        }
        guard.tasks.clear();
    }

    fn purge_done(tasks: &mut HashMap<ClientId, Vec<TaskHandle>>) {
        tasks.retain(|_, handles| {
            handles.retain(|task| !task.is_done());
            !handles.is_empty()
        });
    }
}
