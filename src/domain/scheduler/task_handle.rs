use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use uuid::Uuid;

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const COMPLETED: u8 = 2;
const CANCELLED: u8 = 3;

/// Cancellable handle of one allocation attempt.
///
/// An attempt is pending while it waits in the control queue or in the deferred
/// queue, running while the control loop evaluates it, and done once it was
/// granted, rejected or cancelled.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: Uuid,
    state: Arc<AtomicU8>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4(), state: Arc::new(AtomicU8::new(PENDING)) }
    }

    pub fn get_id(&self) -> Uuid {
        self.id
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state.load(Ordering::Acquire), COMPLETED | CANCELLED)
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// Cancels the attempt unless it is already done.
    ///
    /// An attempt that is evaluated right now still finishes; if it ends up
    /// deferred it is dropped instead of queued.
    ///
    /// # Returns
    /// Returns true if this call cancelled the attempt.
    pub fn cancel(&self) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| match state {
                PENDING | RUNNING => Some(CANCELLED),
                _ => None,
            })
            .is_ok()
    }

    /// Moves a pending attempt to running. Fails if it was cancelled.
    pub(crate) fn begin(&self) -> bool {
        self.state.compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    /// Moves a running attempt back to pending after it was deferred.
    /// Fails if it was cancelled while running.
    pub(crate) fn suspend(&self) -> bool {
        self.state.compare_exchange(RUNNING, PENDING, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    pub(crate) fn complete(&self) {
        let _ = self.state.compare_exchange(RUNNING, COMPLETED, Ordering::AcqRel, Ordering::Acquire);
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_task_ignores_cancel() {
        let task = TaskHandle::new();
        assert!(task.begin());
        task.complete();

        assert!(task.is_done());
        assert!(!task.cancel());
        assert!(!task.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let task = TaskHandle::new();
        assert!(task.cancel());
        assert!(!task.cancel());
        assert!(task.is_done());
        assert!(!task.begin());
    }

    #[test]
    fn cancel_while_running_prevents_suspend() {
        let task = TaskHandle::new();
        assert!(task.begin());
        assert!(task.cancel());
        assert!(!task.suspend());
        assert!(task.is_cancelled());
    }

    #[test]
    fn deferred_task_can_run_again() {
        let task = TaskHandle::new();
        assert!(task.begin());
        assert!(task.suspend());
        assert!(!task.is_done());
        assert!(task.begin());
    }
}
