//! Retry policy and the retry state machine.
//!
//! The transport does not loop implicitly. Each logical call owns a
//! [`RetryMachine`] and feeds it one [`Transition`] per event; the machine
//! answers with the next [`RetryState`].
//!
//! ```text
//!            Start
//!   Idle ─────────────▶ Attempting{a}
//!                          │  Success              ─▶ Done(Succeeded)
//!                          │  NonRetryableFailure  ─▶ Done(Rejected)
//!                          │  Cancelled            ─▶ Done(Cancelled)
//!                          │  RetryableFailure, a == max ─▶ Done(Exhausted)
//!                          ▼  RetryableFailure, a <  max
//!                    Backoff{a+1, wait * (a+1)}
//!                          │  Cancelled            ─▶ Done(Cancelled)
//!                          ▼  BackoffElapsed
//!                    Attempting{a+1}
//! ```
//!
//! Backoff is linear: the wait before attempt `a` is `retry_wait * a`.
//!
//! # Examples
//!
//! ```
//! use whooktown::transport::{RetryMachine, RetryPolicy, RetryState, Transition, Finish};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(1, Duration::from_millis(100));
//! let mut machine = RetryMachine::new(policy);
//!
//! assert_eq!(machine.apply(Transition::Start), RetryState::Attempting { attempt: 0 });
//! assert_eq!(
//!     machine.apply(Transition::RetryableFailure),
//!     RetryState::Backoff { attempt: 1, delay: Duration::from_millis(100) }
//! );
//! assert_eq!(machine.apply(Transition::BackoffElapsed), RetryState::Attempting { attempt: 1 });
//! assert_eq!(machine.apply(Transition::RetryableFailure), RetryState::Done(Finish::Exhausted));
//! ```

use crate::error::{Error, ErrorKind};
use std::time::Duration;

/// Default number of additional attempts after the first one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between attempts.
pub const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(1);

/// How many times to retry and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Base delay; the wait before attempt `a` is `retry_wait * a`
    pub retry_wait: Duration,
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_retries: u32, retry_wait: Duration) -> Self {
        Self {
            max_retries,
            retry_wait,
        }
    }

    /// Delay before attempt index `attempt`. Zero for the first attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        linear_backoff(attempt, self.retry_wait)
    }

    /// Upper bound on attempts for one call.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_WAIT)
    }
}

/// Linear backoff delay calculation.
pub fn linear_backoff(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(attempt)
}

/// Check if status code is a client error (never retried).
pub fn is_client_error_status(status: u16) -> bool {
    (400..500).contains(&status)
}

/// Whether a failed attempt may be retried.
///
/// Client errors (any status in 400..500, quota errors included), validation
/// errors and cancellations are final. Network failures, 5xx responses and
/// undecodable bodies are retried.
pub fn is_retryable(err: &Error) -> bool {
    if err.status().is_some_and(is_client_error_status) {
        return false;
    }
    !matches!(err.kind(), ErrorKind::Validation | ErrorKind::Timeout)
}

/// Why a call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// An attempt succeeded
    Succeeded,
    /// An attempt failed with a non-retryable error
    Rejected,
    /// Every allowed attempt failed
    Exhausted,
    /// The caller's context finished
    Cancelled,
}

/// Position of a call in the retry state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Not started
    Idle,
    /// Executing attempt `attempt` (0-based)
    Attempting {
        /// Attempt index
        attempt: u32,
    },
    /// Waiting `delay` before attempt `attempt`
    Backoff {
        /// Index of the attempt that follows the wait
        attempt: u32,
        /// Wait duration
        delay: Duration,
    },
    /// Terminal
    Done(Finish),
}

/// Events fed to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Begin the first attempt
    Start,
    /// The current attempt succeeded
    Success,
    /// The current attempt failed and may be retried
    RetryableFailure,
    /// The current attempt failed and must not be retried
    NonRetryableFailure,
    /// The backoff wait finished
    BackoffElapsed,
    /// The caller's context finished
    Cancelled,
}

/// Retry state machine for one logical call.
///
/// Transitions that make no sense for the current state (for example
/// `Success` while in `Backoff`) leave the state unchanged. `Done` is
/// absorbing.
#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RetryPolicy,
    state: RetryState,
}

impl RetryMachine {
    /// Create an idle machine.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Policy driving the machine.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Apply a transition and return the new state.
    pub fn apply(&mut self, transition: Transition) -> RetryState {
        self.state = match (self.state, transition) {
            (RetryState::Done(finish), _) => RetryState::Done(finish),

            (RetryState::Idle, Transition::Start) => RetryState::Attempting { attempt: 0 },
            (RetryState::Idle, Transition::Cancelled) => RetryState::Done(Finish::Cancelled),

            (RetryState::Attempting { .. }, Transition::Success) => {
                RetryState::Done(Finish::Succeeded)
            }
            (RetryState::Attempting { .. }, Transition::NonRetryableFailure) => {
                RetryState::Done(Finish::Rejected)
            }
            (RetryState::Attempting { .. }, Transition::Cancelled) => {
                RetryState::Done(Finish::Cancelled)
            }
            (RetryState::Attempting { attempt }, Transition::RetryableFailure) => {
                if attempt < self.policy.max_retries {
                    let next = attempt + 1;
                    RetryState::Backoff {
                        attempt: next,
                        delay: self.policy.delay_for(next),
                    }
                } else {
                    RetryState::Done(Finish::Exhausted)
                }
            }

            (RetryState::Backoff { attempt, .. }, Transition::BackoffElapsed) => {
                RetryState::Attempting { attempt }
            }
            (RetryState::Backoff { .. }, Transition::Cancelled) => {
                RetryState::Done(Finish::Cancelled)
            }

            (state, _) => state,
        };
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn machine(max_retries: u32) -> RetryMachine {
        RetryMachine::new(RetryPolicy::new(max_retries, Duration::from_millis(10)))
    }

    #[test]
    fn test_linear_backoff() {
        let base = Duration::from_millis(250);
        assert_eq!(linear_backoff(0, base), Duration::ZERO);
        assert_eq!(linear_backoff(1, base), Duration::from_millis(250));
        assert_eq!(linear_backoff(2, base), Duration::from_millis(500));
        assert_eq!(linear_backoff(3, base), Duration::from_millis(750));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.retry_wait, Duration::from_secs(1));
        assert_eq!(policy.total_attempts(), 4);
    }

    #[test]
    fn test_retries_until_exhausted() {
        let mut m = machine(3);
        m.apply(Transition::Start);

        let mut attempts = 1;
        let mut delays = Vec::new();
        loop {
            match m.apply(Transition::RetryableFailure) {
                RetryState::Backoff { delay, .. } => {
                    delays.push(delay);
                    m.apply(Transition::BackoffElapsed);
                    attempts += 1;
                }
                RetryState::Done(finish) => {
                    assert_eq!(finish, Finish::Exhausted);
                    break;
                }
                other => panic!("unexpected state {other:?}"),
            }
        }

        assert_eq!(attempts, 4);
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(30)
            ]
        );
    }

    #[test]
    fn test_non_retryable_stops_immediately() {
        let mut m = machine(3);
        m.apply(Transition::Start);
        assert_eq!(
            m.apply(Transition::NonRetryableFailure),
            RetryState::Done(Finish::Rejected)
        );
    }

    #[test]
    fn test_cancel_during_backoff() {
        let mut m = machine(3);
        m.apply(Transition::Start);
        m.apply(Transition::RetryableFailure);
        assert_eq!(m.apply(Transition::Cancelled), RetryState::Done(Finish::Cancelled));
        assert_eq!(m.apply(Transition::BackoffElapsed), RetryState::Done(Finish::Cancelled));
    }

    #[test]
    fn test_zero_retries() {
        let mut m = machine(0);
        m.apply(Transition::Start);
        assert_eq!(
            m.apply(Transition::RetryableFailure),
            RetryState::Done(Finish::Exhausted)
        );
    }

    #[test]
    fn test_invalid_transition_is_ignored() {
        let mut m = machine(1);
        assert_eq!(m.apply(Transition::Success), RetryState::Idle);
        m.apply(Transition::Start);
        m.apply(Transition::RetryableFailure);
        assert!(matches!(m.apply(Transition::Success), RetryState::Backoff { attempt: 1, .. }));
    }

    #[test]
    fn test_is_retryable() {
        let server = Error::from(ApiError::new(ErrorKind::InternalServer, "boom").with_status(500));
        let client = Error::from(ApiError::new(ErrorKind::BadRequest, "bad").with_status(400));
        let other_4xx = Error::from(ApiError::new(ErrorKind::InternalServer, "x").with_status(429));
        let network = Error::from(ApiError::new(ErrorKind::Network, "reset"));
        let decode = Error::from(ApiError::new(ErrorKind::InternalServer, "failed to parse response"));
        let validation = Error::from(ApiError::new(ErrorKind::Validation, "bad body"));
        let timeout = Error::from(ApiError::new(ErrorKind::Timeout, "cancelled"));

        assert!(is_retryable(&server));
        assert!(is_retryable(&network));
        assert!(is_retryable(&decode));
        assert!(!is_retryable(&client));
        assert!(!is_retryable(&other_4xx));
        assert!(!is_retryable(&validation));
        assert!(!is_retryable(&timeout));
    }
}
