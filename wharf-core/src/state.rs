//! Build state machine
//!
//! Tracks whether the latest build's artifacts may be served. A finished
//! build flips the context to `Valid` immediately, but its side effects
//! (reporting, releasing waiters) run one scheduler tick later and only if
//! no invalidation happened in between: every invalidation bumps the
//! context generation, and the deferred settle step checks the generation
//! it captured.

use crate::compiler::LifecycleListener;
use crate::context::{lock, BuildState, SharedContext};
use crate::gate::ReadinessGate;
use crate::reporter::{ReportState, Reporter};
use crate::scheduler::Scheduler;
use crate::stats::BuildStats;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace, warn};

/// Starts another build cycle (normally `Watching::invalidate`)
pub type RebuildTrigger = Arc<dyn Fn() + Send + Sync>;

struct Inner {
    context: SharedContext,
    gate: ReadinessGate,
    scheduler: Arc<dyn Scheduler>,
    reporter: Arc<dyn Reporter>,
    rebuild: Mutex<Option<RebuildTrigger>>,
}

/// Valid/invalid state machine driven by compiler lifecycle events
///
/// Cloning yields another handle to the same machine.
#[derive(Clone)]
pub struct BuildStateMachine {
    inner: Arc<Inner>,
}

impl BuildStateMachine {
    pub fn new(
        context: SharedContext,
        scheduler: Arc<dyn Scheduler>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let gate = ReadinessGate::new(context.clone());
        Self {
            inner: Arc::new(Inner {
                context,
                gate,
                scheduler,
                reporter,
                rebuild: Mutex::new(None),
            }),
        }
    }

    /// The gate sharing this machine's context
    pub fn gate(&self) -> &ReadinessGate {
        &self.inner.gate
    }

    pub fn context(&self) -> &SharedContext {
        &self.inner.context
    }

    pub fn state(&self) -> BuildState {
        lock(&self.inner.context).state()
    }

    pub fn last_stats(&self) -> Option<Arc<BuildStats>> {
        lock(&self.inner.context).last_stats()
    }

    /// Install what a forced rebuild calls
    pub fn set_rebuild_trigger(&self, trigger: RebuildTrigger) {
        *self
            .inner
            .rebuild
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(trigger);
    }

    /// Remove the rebuild trigger (the watch loop is gone)
    pub fn clear_rebuild_trigger(&self) {
        *self
            .inner
            .rebuild
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// A build is starting: artifacts are no longer servable.
    pub fn invalidate(&self) {
        self.mark_invalid(true);
    }

    /// A build finished with `stats`.
    ///
    /// If a rebuild was requested while this build ran, another cycle starts
    /// right away and the waiters stay queued for that cycle.
    pub fn finish(&self, stats: BuildStats) {
        let stats = Arc::new(stats);
        let (generation, force_rebuild) = {
            let mut ctx = lock(&self.inner.context);
            ctx.state = BuildState::Valid;
            ctx.settled = false;
            ctx.last_stats = Some(stats);
            (ctx.generation, std::mem::take(&mut ctx.force_rebuild))
        };
        trace!(target: "wharf::state", generation, "build finished");

        let machine = self.clone();
        self.inner
            .scheduler
            .defer(Box::new(move || machine.settle(generation)));

        if force_rebuild {
            self.rebuild();
        }
    }

    /// Ask for a fresh build.
    ///
    /// Returns `true` when the caller should invalidate the watch loop now;
    /// `false` when a build is already in flight and the request was
    /// recorded to run once it finishes.
    pub fn request_rebuild(&self) -> bool {
        let mut ctx = lock(&self.inner.context);
        if ctx.state == BuildState::Invalid {
            ctx.force_rebuild = true;
            debug!(target: "wharf::state", "build in flight, rebuild queued");
            false
        } else {
            true
        }
    }

    fn mark_invalid(&self, notify: bool) {
        let was_valid = {
            let mut ctx = lock(&self.inner.context);
            let was_valid = ctx.state == BuildState::Valid;
            ctx.state = BuildState::Invalid;
            ctx.settled = false;
            ctx.generation += 1;
            trace!(target: "wharf::state", generation = ctx.generation, "invalidated");
            was_valid
        };

        if was_valid && notify {
            self.inner.reporter.report(&ReportState::invalid());
        }
    }

    fn rebuild(&self) {
        let trigger = self
            .inner
            .rebuild
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(trigger) = trigger else {
            warn!(target: "wharf::state", "rebuild requested without an active watch loop");
            return;
        };

        debug!(target: "wharf::state", "rebuilding: invalidated while compiling");
        // Flip now so the pending settle step of the build that just
        // finished is cancelled; the watch loop itself is poked next tick.
        self.mark_invalid(true);
        self.inner.scheduler.defer(Box::new(move || trigger()));
    }

    fn settle(&self, generation: u64) {
        let (stats, batch) = {
            let mut ctx = lock(&self.inner.context);
            if ctx.generation != generation || ctx.state != BuildState::Valid {
                trace!(
                    target: "wharf::state",
                    captured = generation,
                    current = ctx.generation,
                    "settle skipped: invalidated since build finished"
                );
                return;
            }
            let Some(stats) = ctx.last_stats.clone() else {
                return;
            };
            ctx.settled = true;
            (stats, std::mem::take(&mut ctx.pending))
        };

        self.inner.reporter.report(&ReportState::valid(stats.clone()));
        self.inner.gate.flush(batch, &stats);
    }
}

impl LifecycleListener for BuildStateMachine {
    fn on_build_started(&self) {
        self.invalidate();
    }

    fn on_watch_run_started(&self) {
        self.invalidate();
    }

    fn on_build_finished(&self, stats: BuildStats) {
        self.finish(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildContext, PendingRequest};
    use crate::scheduler::TickQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingReporter {
        reports: Mutex<Vec<ReportState>>,
    }

    impl RecordingReporter {
        fn validity(&self) -> Vec<bool> {
            self.reports.lock().unwrap().iter().map(|r| r.is_valid).collect()
        }
    }

    impl Reporter for RecordingReporter {
        fn report(&self, state: &ReportState) {
            self.reports.lock().unwrap().push(state.clone());
        }
    }

    fn machine() -> (BuildStateMachine, TickQueue, Arc<RecordingReporter>) {
        let queue = TickQueue::new();
        let reporter = Arc::new(RecordingReporter::default());
        let machine = BuildStateMachine::new(
            BuildContext::shared(),
            Arc::new(queue.clone()),
            reporter.clone(),
        );
        (machine, queue, reporter)
    }

    fn hash_log(machine: &BuildStateMachine) -> Arc<Mutex<Vec<Option<String>>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        machine.gate().await_ready(PendingRequest::new(move |stats| {
            sink.lock().unwrap().push(stats.hash.clone());
        }));
        log
    }

    #[test]
    fn test_initial_state_is_invalid() {
        let (machine, _, _) = machine();
        assert_eq!(machine.state(), BuildState::Invalid);
        assert!(machine.last_stats().is_none());
    }

    #[test]
    fn test_state_follows_build_events() {
        let (machine, queue, _) = machine();

        machine.on_build_started();
        assert_eq!(machine.state(), BuildState::Invalid);
        machine.on_build_finished(BuildStats::new());
        assert_eq!(machine.state(), BuildState::Valid);
        queue.run_until_idle();

        machine.on_watch_run_started();
        assert_eq!(machine.state(), BuildState::Invalid);
        machine.on_watch_run_started();
        assert_eq!(machine.state(), BuildState::Invalid);
        machine.on_build_finished(BuildStats::new());
        queue.run_until_idle();
        assert_eq!(machine.state(), BuildState::Valid);
    }

    #[test]
    fn test_waiters_released_after_settle_tick() {
        let (machine, queue, reporter) = machine();
        let log = hash_log(&machine);

        machine.on_build_started();
        machine.on_build_finished(BuildStats::new().with_hash("a"));
        assert!(log.lock().unwrap().is_empty());

        queue.run_tick();

        assert_eq!(*log.lock().unwrap(), vec![Some("a".to_string())]);
        assert_eq!(reporter.validity(), vec![true]);
    }

    #[test]
    fn test_invalidation_before_tick_cancels_settle() {
        let (machine, queue, reporter) = machine();
        let log = hash_log(&machine);

        machine.on_build_finished(BuildStats::new().with_hash("a"));
        machine.on_build_started();
        queue.run_until_idle();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(machine.state(), BuildState::Invalid);
        // Only the invalidation got reported.
        assert_eq!(reporter.validity(), vec![false]);

        machine.on_build_finished(BuildStats::new().with_hash("b"));
        queue.run_until_idle();
        assert_eq!(*log.lock().unwrap(), vec![Some("b".to_string())]);
    }

    #[test]
    fn test_two_finishes_release_once() {
        let (machine, queue, _) = machine();
        let log = hash_log(&machine);

        machine.on_build_finished(BuildStats::new().with_hash("a"));
        machine.on_build_finished(BuildStats::new().with_hash("b"));
        queue.run_until_idle();

        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_build_is_still_valid() {
        let (machine, queue, reporter) = machine();
        let log = hash_log(&machine);

        machine.on_build_finished(BuildStats::new().with_error("syntax error"));
        queue.run_until_idle();

        assert_eq!(machine.state(), BuildState::Valid);
        assert_eq!(log.lock().unwrap().len(), 1);
        let reports = reporter.reports.lock().unwrap();
        assert!(reports[0].stats.as_ref().unwrap().has_errors());
    }

    #[test]
    fn test_invalidated_report_only_from_valid() {
        let (machine, queue, reporter) = machine();

        machine.on_build_started();
        assert!(reporter.validity().is_empty());

        machine.on_build_finished(BuildStats::new());
        queue.run_until_idle();
        machine.on_build_started();
        machine.on_build_started();

        assert_eq!(reporter.validity(), vec![true, false]);
    }

    #[test]
    fn test_forced_rebuild_holds_waiters_for_next_build() {
        let (machine, queue, reporter) = machine();
        let rebuilds = Arc::new(AtomicUsize::new(0));
        let counter = rebuilds.clone();
        machine.set_rebuild_trigger(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        machine.on_build_started();
        assert!(!machine.request_rebuild());
        let log = hash_log(&machine);

        machine.on_build_finished(BuildStats::new().with_hash("first"));
        assert_eq!(machine.state(), BuildState::Invalid);
        queue.run_until_idle();

        assert_eq!(rebuilds.load(Ordering::SeqCst), 1);
        assert!(log.lock().unwrap().is_empty());
        assert!(!lock(machine.context()).force_rebuild_requested());
        // The first build never settles, so only the restart is reported.
        assert_eq!(reporter.validity(), vec![false]);

        machine.on_watch_run_started();
        machine.on_build_finished(BuildStats::new().with_hash("second"));
        queue.run_until_idle();

        assert_eq!(*log.lock().unwrap(), vec![Some("second".to_string())]);
        assert_eq!(rebuilds.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.validity(), vec![false, true]);
    }

    #[test]
    fn test_request_rebuild_when_valid() {
        let (machine, queue, _) = machine();
        machine.on_build_finished(BuildStats::new());
        queue.run_until_idle();

        assert!(machine.request_rebuild());
        assert!(!lock(machine.context()).force_rebuild_requested());
    }

    #[test]
    fn test_forced_rebuild_without_trigger_still_settles() {
        let (machine, queue, _) = machine();
        machine.on_build_started();
        machine.request_rebuild();
        let log = hash_log(&machine);

        machine.on_build_finished(BuildStats::new().with_hash("only"));
        queue.run_until_idle();

        assert_eq!(*log.lock().unwrap(), vec![Some("only".to_string())]);
    }
}
