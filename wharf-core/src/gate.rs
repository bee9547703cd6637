//! Readiness gate
//!
//! Callers that need a stable artifact set go through the gate. While the
//! build context is settled-valid they run at once; otherwise they queue
//! until the state machine releases the whole queue after the next build.

use crate::context::{lock, PendingRequest, SharedContext};
use crate::stats::BuildStats;
use tracing::{debug, info};

/// Queue of callers waiting for a servable artifact set
#[derive(Clone)]
pub struct ReadinessGate {
    context: SharedContext,
}

impl ReadinessGate {
    pub fn new(context: SharedContext) -> Self {
        Self { context }
    }

    /// Run `request` now if the artifacts are servable, otherwise queue it.
    ///
    /// There is no timeout: if builds never complete, the request waits
    /// until teardown aborts it. Once the gate is closed, a request that
    /// would have to wait is released right away with aborted stats.
    pub fn await_ready(&self, request: PendingRequest) {
        let mut ctx = lock(&self.context);
        let stats = match ctx.ready_stats() {
            Some(stats) => stats,
            None if ctx.closed => {
                drop(ctx);
                debug!(target: "wharf::gate", "closed, not waiting");
                request.release(&BuildStats::aborted());
                return;
            }
            None => {
                match request.origin() {
                    Some(origin) => info!(
                        target: "wharf::gate",
                        "wait until bundle finished: {}",
                        origin
                    ),
                    None => debug!(target: "wharf::gate", "wait until bundle finished"),
                }
                ctx.pending.push(request);
                return;
            }
        };
        drop(ctx);

        request.release(&stats);
    }

    /// Release a batch taken from the queue, in enqueue order.
    ///
    /// The batch is owned by the caller, so requests queued by a callback
    /// of this batch are never part of it.
    pub fn flush(&self, batch: Vec<PendingRequest>, stats: &BuildStats) {
        if batch.is_empty() {
            return;
        }
        debug!(target: "wharf::gate", released = batch.len(), "releasing waiting requests");
        for request in batch {
            request.release(stats);
        }
    }

    /// Stop queueing: later waiters are aborted instead of held.
    ///
    /// Requests already queued stay queued until [`abort_pending`](Self::abort_pending).
    pub fn close(&self) {
        lock(&self.context).closed = true;
    }

    /// Take every queued request out of the context
    pub fn take_pending(&self) -> Vec<PendingRequest> {
        std::mem::take(&mut lock(&self.context).pending)
    }

    /// Release every queued request with aborted stats; used on teardown
    pub fn abort_pending(&self) -> usize {
        let batch = self.take_pending();
        let count = batch.len();
        if count > 0 {
            debug!(target: "wharf::gate", aborted = count, "aborting waiting requests");
        }
        self.flush(batch, &BuildStats::aborted());
        count
    }

    /// Number of queued requests
    pub fn pending_len(&self) -> usize {
        lock(&self.context).pending_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildContext, BuildState};
    use std::sync::{Arc, Mutex};

    fn settled_context() -> SharedContext {
        let context = BuildContext::shared();
        {
            let mut ctx = lock(&context);
            ctx.state = BuildState::Valid;
            ctx.settled = true;
            ctx.last_stats = Some(Arc::new(BuildStats::new().with_hash("h1")));
        }
        context
    }

    #[test]
    fn test_settled_context_runs_immediately() {
        let gate = ReadinessGate::new(settled_context());
        let seen = Arc::new(Mutex::new(None));

        let sink = seen.clone();
        gate.await_ready(PendingRequest::new(move |stats| {
            *sink.lock().unwrap() = stats.hash.clone();
        }));

        assert_eq!(seen.lock().unwrap().as_deref(), Some("h1"));
        assert_eq!(gate.pending_len(), 0);
    }

    #[test]
    fn test_valid_but_unsettled_context_queues() {
        let context = settled_context();
        lock(&context).settled = false;
        let gate = ReadinessGate::new(context);

        gate.await_ready(PendingRequest::new(|_| panic!("must wait")));

        assert_eq!(gate.pending_len(), 1);
    }

    #[test]
    fn test_flush_preserves_order() {
        let gate = ReadinessGate::new(BuildContext::shared());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let sink = seen.clone();
            gate.await_ready(PendingRequest::new(move |_| sink.lock().unwrap().push(i)).with_origin("/x"));
        }
        assert_eq!(gate.pending_len(), 5);

        let batch = gate.take_pending();
        gate.flush(batch, &BuildStats::new());

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(gate.pending_len(), 0);
    }

    #[test]
    fn test_requests_queued_during_flush_wait_for_next_cycle() {
        let gate = ReadinessGate::new(BuildContext::shared());
        let count = Arc::new(Mutex::new(0));

        let requeue_gate = gate.clone();
        let counter = count.clone();
        gate.await_ready(PendingRequest::new(move |_| {
            *counter.lock().unwrap() += 1;
            let again = counter.clone();
            requeue_gate.await_ready(PendingRequest::new(move |_| *again.lock().unwrap() += 1));
        }));

        let batch = gate.take_pending();
        gate.flush(batch, &BuildStats::new());

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(gate.pending_len(), 1);
    }

    #[test]
    fn test_abort_pending_releases_everyone() {
        let gate = ReadinessGate::new(BuildContext::shared());
        let aborted = Arc::new(Mutex::new(0));

        for _ in 0..3 {
            let sink = aborted.clone();
            gate.await_ready(PendingRequest::new(move |stats| {
                assert!(stats.is_aborted());
                *sink.lock().unwrap() += 1;
            }));
        }

        assert_eq!(gate.abort_pending(), 3);
        assert_eq!(*aborted.lock().unwrap(), 3);
        assert_eq!(gate.abort_pending(), 0);
    }

    #[test]
    fn test_closed_gate_aborts_instead_of_queueing() {
        let gate = ReadinessGate::new(BuildContext::shared());
        gate.await_ready(PendingRequest::new(|stats| assert!(stats.is_aborted())));
        gate.close();
        assert!(lock(&gate.context).is_closed());

        let aborted = Arc::new(Mutex::new(false));
        let sink = aborted.clone();
        gate.await_ready(PendingRequest::new(move |stats| {
            *sink.lock().unwrap() = stats.is_aborted();
        }));

        assert!(*aborted.lock().unwrap());
        assert_eq!(gate.pending_len(), 1);
        assert_eq!(gate.abort_pending(), 1);
    }

    #[test]
    fn test_closed_gate_still_serves_settled_stats() {
        let gate = ReadinessGate::new(settled_context());
        gate.close();
        let seen = Arc::new(Mutex::new(None));

        let sink = seen.clone();
        gate.await_ready(PendingRequest::new(move |stats| {
            *sink.lock().unwrap() = stats.hash.clone();
        }));

        assert_eq!(seen.lock().unwrap().as_deref(), Some("h1"));
    }
}
