//! Server lifecycle: health state, call admission, and drain.
//!
//! Health state lives in an `ArcSwap` so probes read it without locking.
//! Every call is admitted through [`ShutdownController::try_admit`], which
//! hands out an [`InFlightGuard`]. The last guard to drop while the server is
//! draining wakes [`ShutdownController::wait_for_drain`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::Notify;

/// Server health state.
///
/// State machine: Starting -> Ready -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Registry is being populated; no calls accepted yet.
    Starting,
    /// Accepting calls.
    Ready,
    /// Shutdown requested; waiting for in-flight calls.
    Draining,
    /// All in-flight calls finished.
    Stopped,
}

impl HealthState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

/// Calls currently between admission and response.
#[derive(Debug, Default)]
struct CallTracker {
    running: AtomicU64,
    idle: Notify,
}

impl CallTracker {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.running.fetch_add(1, Ordering::AcqRel);
        InFlightGuard {
            tracker: Arc::clone(self),
        }
    }

    fn running(&self) -> u64 {
        self.running.load(Ordering::Acquire)
    }
}

/// Coordinates readiness, call admission and graceful shutdown.
///
/// 1. `set_ready()` once the listener is bound and the registry is frozen
/// 2. each call handler holds the guard from `try_admit()` until it responds
/// 3. `trigger_shutdown()` moves to Draining; `try_admit()` refuses from then on
/// 4. `wait_for_drain()` returns once the last guard is dropped
#[derive(Debug)]
pub struct ShutdownController {
    calls: Arc<CallTracker>,
    health_state: ArcSwap<HealthState>,
}

impl ShutdownController {
    /// Creates a controller in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Arc::new(CallTracker::default()),
            health_state: ArcSwap::from_pointee(HealthState::Starting),
        }
    }

    pub fn set_ready(&self) {
        self.health_state.store(Arc::new(HealthState::Ready));
    }

    /// Moves to `Draining`. Calls already admitted keep running.
    pub fn trigger_shutdown(&self) {
        self.health_state.store(Arc::new(HealthState::Draining));
    }

    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.health_state.load()
    }

    /// Whether new calls are accepted.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.health_state() == HealthState::Ready
    }

    /// Admits one call, or returns `None` unless the server is `Ready`.
    ///
    /// The state is checked again after the call is counted, so a call that
    /// races with `trigger_shutdown` is either refused or seen by the drain.
    #[must_use]
    pub fn try_admit(&self) -> Option<InFlightGuard> {
        if !self.is_accepting() {
            return None;
        }
        let guard = self.calls.enter();
        self.is_accepting().then_some(guard)
    }

    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.calls.running()
    }

    /// Waits up to `timeout` for admitted calls to finish.
    ///
    /// Returns `true` and moves to `Stopped` on success; returns `false` and
    /// stays in `Draining` if the timeout expires first.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let idle = self.calls.idle.notified();
            tokio::pin!(idle);
            // Register before reading the count so a concurrent last drop
            // cannot be missed.
            idle.as_mut().enable();

            if self.calls.running() == 0 {
                self.health_state.store(Arc::new(HealthState::Stopped));
                return true;
            }

            if tokio::time::timeout_at(deadline, idle).await.is_err() {
                return false;
            }
        }
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks one admitted call; dropping it (also during unwinding) releases it.
#[derive(Debug)]
pub struct InFlightGuard {
    tracker: Arc<CallTracker>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.tracker.running.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}
