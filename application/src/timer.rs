//! Single-fire timer scheduling.
//!
//! [`TimerScheduler`] runs a future once after a delay and hands back a
//! cancellable [`TimerHandle`]. Cancellation is advisory: a callback that
//! has already started runs to completion, so callbacks that act on shared
//! state must re-validate it themselves before acting.
//!
//! [`TokioTimerScheduler`] is the runtime implementation. Every timer races
//! a `tokio::time::sleep` against a child of the scheduler's root
//! [`CancellationToken`], so [`TokioTimerScheduler::shutdown`] (or dropping
//! the scheduler) stops every pending timer at once.

use futures::future::BoxFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Handle to one scheduled callback.
///
/// Dropping the handle does not cancel the timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    token: CancellationToken,
}

impl TimerHandle {
    pub fn new(id: u64, token: CancellationToken) -> Self {
        Self { id, token }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Idempotent; safe after the callback has fired or been cancelled.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Schedules single-fire callbacks.
pub trait TimerScheduler: Send + Sync {
    /// Run `task` once after `delay`, unless cancelled first.
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle;

    /// Cancel a pending timer. Idempotent.
    fn cancel(&self, handle: &TimerHandle) {
        handle.cancel();
    }
}

/// Tokio-backed scheduler; must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioTimerScheduler {
    root: CancellationToken,
    next_id: AtomicU64,
}

impl TokioTimerScheduler {
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Cancel every pending timer. Timers scheduled afterwards never fire.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}

impl Default for TokioTimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TokioTimerScheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

impl TimerScheduler for TokioTimerScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        let guard = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = guard.cancelled() => {
                    trace!(timer = id, "timer cancelled before firing");
                }
                _ = tokio::time::sleep(delay) => {
                    trace!(timer = id, "timer fired");
                    task.await;
                }
            }
        });

        TimerHandle::new(id, token)
    }
}
