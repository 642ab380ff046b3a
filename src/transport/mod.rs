//! Resilient HTTP transport.
//!
//! This module turns a logical `(method, path, body)` triple into a retried,
//! cancellable network call and translates failure responses into the
//! crate's error taxonomy.
//!
//! # Module Organization
//!
//! ```text
//! transport/
//! ├── http        - Transport, verbs and the execution routine
//! ├── retry       - RetryPolicy and the retry state machine
//! ├── classifier  - Failure response classification
//! ├── context     - CallContext (cancellation + deadline)
//! └── credentials - Bearer/admin token store
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Transport`] | Retrying JSON transport for one base URL |
//! | [`TransportConfig`] | Retry count, base delay, engine timeout, debug flag |
//! | [`CallContext`] | Per-call cancellation token and deadline |
//! | [`RetryMachine`] | Explicit retry state machine |
//! | [`ErrorBody`] | Schema-tolerant view of an error response |
//!
//! # Retry Behavior
//!
//! - **2xx/3xx**: returned immediately, body decoded when requested and non-empty
//! - **4xx** (including 402 quota errors): returned immediately, never retried
//! - **5xx, network failures, undecodable bodies**: retried up to `max_retries`
//!   times, waiting `retry_wait * attempt` before each retry
//! - **Cancellation/deadline**: aborts the attempt or the wait, returns a timeout error
//!
//! # Examples
//!
//! ```
//! use whooktown::transport::{classify, is_retryable, linear_backoff};
//! use std::time::Duration;
//!
//! assert!(is_retryable(&classify(503, b"")));
//! assert!(!is_retryable(&classify(404, b"")));
//! assert_eq!(linear_backoff(2, Duration::from_millis(100)), Duration::from_millis(200));
//! ```

mod classifier;
mod context;
mod credentials;
mod http;
mod retry;

pub use classifier::{
    classify, default_message, kind_for_status, ErrorBody, Field, QuotaDetails, QUOTA_CODES,
};
pub use context::{CallContext, CancelCause};
pub use credentials::{CredentialSnapshot, Credentials};
pub use http::{
    build_engine, segment_path, Decode, RequestDescriptor, Transport, TransportConfig,
    ADMIN_TOKEN_HEADER, DEFAULT_REQUEST_TIMEOUT, JSON_MEDIA_TYPE, NO_BODY,
};
pub use retry::{
    is_client_error_status, is_retryable, linear_backoff, Finish, RetryMachine, RetryPolicy,
    RetryState, Transition, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_WAIT,
};
