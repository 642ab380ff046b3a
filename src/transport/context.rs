//! Per-call cancellation and deadlines.
//!
//! Every transport verb takes a [`CallContext`]. The context finishes when its
//! [`CancellationToken`] is cancelled or its deadline passes, whichever comes
//! first. A finished context aborts the in-flight request or the pending
//! backoff wait, and the call returns a timeout-kind error whose cause is the
//! [`CancelCause`].
//!
//! # Examples
//!
//! ```
//! use whooktown::transport::CallContext;
//! use std::time::Duration;
//!
//! let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
//! let child = ctx.child();
//! ctx.cancel();
//! assert!(child.is_cancelled());
//! ```

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CancelCause {
    /// The token was cancelled
    #[error("context canceled")]
    Cancelled,
    /// The deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation signal and optional deadline for one logical call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that never finishes on its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context driven by an existing token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Finish after `timeout` from now. Keeps an earlier deadline if one is set.
    ///
    /// A timeout too large to represent sets no deadline.
    #[must_use]
    pub fn with_timeout(self, timeout: std::time::Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Finish at `deadline`. Keeps an earlier deadline if one is set.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// A context cancelled with this one, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Non-blocking check of both conditions.
    pub fn finished(&self) -> Option<CancelCause> {
        if self.token.is_cancelled() {
            Some(CancelCause::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(CancelCause::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves when the context finishes.
    pub async fn done(&self) -> CancelCause {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => CancelCause::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => CancelCause::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelCause::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_done_on_cancel() {
        let ctx = CallContext::new();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });

        ctx.cancel();
        assert_eq!(handle.await.unwrap(), CancelCause::Cancelled);
        assert_eq!(ctx.finished(), Some(CancelCause::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_on_deadline() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(30));
        assert_eq!(ctx.finished(), None);
        assert_eq!(ctx.done().await, CancelCause::DeadlineExceeded);
        assert_eq!(ctx.finished(), Some(CancelCause::DeadlineExceeded));
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = CallContext::new()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_unrepresentable_timeout_sets_no_deadline() {
        let ctx = CallContext::new().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.finished(), None);

        let bounded = CallContext::new()
            .with_timeout(Duration::from_secs(5))
            .with_timeout(Duration::MAX);
        assert!(bounded.deadline().is_some());
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = CallContext::new();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());

        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
