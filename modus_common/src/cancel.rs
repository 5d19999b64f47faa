//! One-shot cancellation token.
//!
//! A single token is created per engine run and cloned into every running
//! module. It moves once from active to cancelled and never reverts.
//! Built on [`tokio_util::sync::CancellationToken`]; this wrapper adds the
//! first-request flag the engine logs with and a cancellable sleep.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cloneable handle to a shared cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    /// Create an active token.
    pub fn new() -> Self {
        Self {
            inner: CancellationToken::new(),
        }
    }

    /// Cancel the token.
    ///
    /// Returns `true` if the token was still active, `false` once it had
    /// already been cancelled. Two callers racing on an active token may
    /// both see `true`; the cancellation itself happens once.
    pub fn cancel(&self) -> bool {
        let first = !self.inner.is_cancelled();
        self.inner.cancel();
        first
    }

    /// Non-blocking check.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Wait until the token is cancelled.
    ///
    /// Suitable as one arm of a `tokio::select!`.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }

    /// Sleep for `total` unless cancelled first.
    ///
    /// Returns `true` if the full duration elapsed, `false` on cancellation.
    pub async fn sleep(&self, total: Duration) -> bool {
        tokio::select! {
            _ = self.inner.cancelled() => false,
            _ = tokio::time::sleep(total) => !self.is_cancelled(),
        }
    }
}
