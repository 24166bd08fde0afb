//! Coordination primitives shared between the dispatcher, the poller and the
//! command executor.
//!
//! Shutdown is one-shot and modelled separately from the two resettable flags so
//! that it can never be cleared by accident.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::types::OperationOutcome;

/// One-shot shutdown request. Once triggered it stays triggered.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

#[derive(Default)]
struct StopInner {
    triggered: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Resolves once `trigger` has been called, immediately if it already was.
    pub async fn triggered(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

/// Advisory "do not touch shared state" flag read by the poller.
///
/// Raising returns a [`PauseGuard`]; the gate is lowered when the guard drops, so
/// every exit path of a paused section (early return, `?`, panic) lowers it.
/// Guards nest: the gate stays raised until the last guard is gone.
#[derive(Debug, Default)]
pub struct PauseGate {
    holders: AtomicUsize,
}

impl PauseGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn raise(self: &Arc<Self>) -> PauseGuard {
        self.holders.fetch_add(1, Ordering::SeqCst);
        PauseGuard { gate: Arc::clone(self) }
    }

    pub fn is_raised(&self) -> bool {
        self.holders.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug)]
pub struct PauseGuard {
    gate: Arc<PauseGate>,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.gate.holders.fetch_sub(1, Ordering::SeqCst);
    }
}

const PENDING: u8 = 0;
const SUCCEEDED: u8 = 1;
const FAILED: u8 = 2;
const TIMED_OUT: u8 = 3;

/// Completion flag for the in-flight lifecycle operation, carrying its outcome.
/// Cleared before each operation, finished exactly once by the worker.
#[derive(Default)]
pub struct OperationDone {
    state: AtomicU8,
    notify: Notify,
}

impl OperationDone {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn clear(&self) {
        self.state.store(PENDING, Ordering::SeqCst);
    }

    pub fn finish(&self, outcome: OperationOutcome) {
        let code = match outcome {
            OperationOutcome::Succeeded => SUCCEEDED,
            OperationOutcome::Failed => FAILED,
            OperationOutcome::TimedOut => TIMED_OUT,
        };
        self.state.store(code, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_set(&self) -> bool {
        self.state.load(Ordering::SeqCst) != PENDING
    }

    pub fn outcome(&self) -> Option<OperationOutcome> {
        match self.state.load(Ordering::SeqCst) {
            SUCCEEDED => Some(OperationOutcome::Succeeded),
            FAILED => Some(OperationOutcome::Failed),
            TIMED_OUT => Some(OperationOutcome::TimedOut),
            _ => None,
        }
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pause_guard_lowers_gate_on_drop() {
        let gate = PauseGate::new();
        assert!(!gate.is_raised());
        {
            let _outer = gate.raise();
            let inner = gate.raise();
            assert!(gate.is_raised());
            drop(inner);
            assert!(gate.is_raised(), "outer guard still holds the gate");
        }
        assert!(!gate.is_raised());
    }

    #[test]
    fn pause_guard_lowers_gate_when_section_errors() {
        fn paused_section(gate: &Arc<PauseGate>, fail: bool) -> Result<(), &'static str> {
            let _guard = gate.raise();
            if fail {
                return Err("boom");
            }
            Ok(())
        }
        let gate = PauseGate::new();
        assert!(paused_section(&gate, true).is_err());
        assert!(!gate.is_raised());
        assert!(paused_section(&gate, false).is_ok());
        assert!(!gate.is_raised());
    }

    #[test]
    fn done_signal_is_reusable_after_clear() {
        let done = OperationDone::new();
        assert!(!done.is_set());
        done.finish(OperationOutcome::Failed);
        assert_eq!(done.outcome(), Some(OperationOutcome::Failed));
        done.clear();
        assert!(!done.is_set());
        assert_eq!(done.outcome(), None);
        done.finish(OperationOutcome::Succeeded);
        assert_eq!(done.outcome(), Some(OperationOutcome::Succeeded));
    }

    #[tokio::test]
    async fn stop_signal_wakes_waiters() {
        let stop = StopSignal::new();
        let waiter = {
            let stop = stop.clone();
            tokio::spawn(async move { stop.triggered().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        stop.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(stop.is_triggered());
        // Already triggered: returns immediately.
        stop.triggered().await;
    }
}
