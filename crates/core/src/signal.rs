//! One-shot, line-wide cancellation signal.
//!
//! Wraps a [`CancellationToken`] and remembers whether a `cancel` call was
//! the one that actually tripped it, so callers can tell a first shutdown
//! request from a repeated one.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Shared shutdown flag plus wake-up for everything waiting on it.
///
/// Starts unset and, once set, is never unset again.
#[derive(Clone, Debug, Default)]
pub struct CancellationSignal {
    token: CancellationToken,
    tripped: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal and wake every waiter.
    ///
    /// Returns `true` only for the call that set it; later calls are no-ops
    /// and return `false`.
    pub fn cancel(&self) -> bool {
        let first = self
            .tripped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        self.token.cancel();
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal is set.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Run `fut` to completion unless the signal is set first.
    ///
    /// Returns `None` when cancelled. An already-set signal wins even if
    /// `fut` would be ready immediately.
    pub async fn run_until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Sleep for `duration`, returning `false` if the signal interrupted it.
    pub async fn sleep(&self, duration: std::time::Duration) -> bool {
        self.run_until_cancelled(tokio::time::sleep(duration))
            .await
            .is_some()
    }
}
