//! Per-coordinator build context

use crate::stats::BuildStats;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback released once the artifact set is servable
pub type ReadyCallback = Box<dyn FnOnce(&BuildStats) + Send>;

/// Whether the latest build's artifacts may be served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// A build is running or about to run
    Invalid,
    /// The latest build finished
    Valid,
}

/// A caller waiting for the artifact set to settle
pub struct PendingRequest {
    origin: Option<String>,
    callback: ReadyCallback,
}

impl PendingRequest {
    pub fn new(callback: impl FnOnce(&BuildStats) + Send + 'static) -> Self {
        Self {
            origin: None,
            callback: Box::new(callback),
        }
    }

    /// Tag the request with what it is waiting for (usually the request URL)
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub(crate) fn release(self, stats: &BuildStats) {
        (self.callback)(stats)
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Mutable state shared by one coordinator's state machine and gate
#[derive(Debug)]
pub struct BuildContext {
    pub(crate) state: BuildState,
    pub(crate) generation: u64,
    pub(crate) settled: bool,
    pub(crate) last_stats: Option<Arc<BuildStats>>,
    pub(crate) pending: Vec<PendingRequest>,
    pub(crate) force_rebuild: bool,
    pub(crate) closed: bool,
}

/// Handle to a [`BuildContext`]
pub type SharedContext = Arc<Mutex<BuildContext>>;

impl BuildContext {
    pub fn new() -> Self {
        Self {
            state: BuildState::Invalid,
            generation: 0,
            settled: false,
            last_stats: None,
            pending: Vec::new(),
            force_rebuild: false,
            closed: false,
        }
    }

    pub fn shared() -> SharedContext {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Incremented by every invalidation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Valid and the deferred settle step for this generation has run
    pub fn is_settled(&self) -> bool {
        self.state == BuildState::Valid && self.settled
    }

    pub fn last_stats(&self) -> Option<Arc<BuildStats>> {
        self.last_stats.clone()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn force_rebuild_requested(&self) -> bool {
        self.force_rebuild
    }

    /// Teardown has started; nothing new is queued from here on
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stats to release a waiter with right now, if the context is settled
    pub(crate) fn ready_stats(&self) -> Option<Arc<BuildStats>> {
        if self.is_settled() {
            self.last_stats.clone()
        } else {
            None
        }
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a context; a panicking callback never runs under this lock, so a
/// poisoned mutex still holds consistent data.
pub fn lock(context: &Mutex<BuildContext>) -> MutexGuard<'_, BuildContext> {
    context.lock().unwrap_or_else(PoisonError::into_inner)
}
