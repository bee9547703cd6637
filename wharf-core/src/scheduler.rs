//! Deferred execution
//!
//! Everything that has to happen "on the next tick" goes through a
//! [`Scheduler`]. [`TickQueue`] is a plain FIFO the embedding event loop drains.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// A unit of deferred work
pub type Task = Box<dyn FnOnce() + Send>;

/// Defers tasks to a later turn of the event loop
pub trait Scheduler: Send + Sync {
    fn defer(&self, task: Task);
}

/// FIFO task queue drained one tick at a time
///
/// Tasks deferred while a tick runs belong to the next tick.
#[derive(Clone, Default)]
pub struct TickQueue {
    tasks: Arc<Mutex<VecDeque<Task>>>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Run the tasks queued before this call; returns how many ran
    pub fn run_tick(&self) -> usize {
        let batch = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }

    /// Run ticks until no task is left; returns how many ran in total
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.run_tick();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }
}

impl Scheduler for TickQueue {
    fn defer(&self, task: Task) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
    }
}

impl std::fmt::Debug for TickQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickQueue")
            .field("pending", &self.pending())
            .finish()
    }
}
