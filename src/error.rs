//! Error types and result handling.
//!
//! Every failure the client can produce is one of two shapes:
//!
//! | Type | When |
//! |------|------|
//! | [`ApiError`] | Any classified failure: HTTP status mapping, network, validation, timeout |
//! | [`QuotaError`] | A 402 whose body carries an explicit quota `code` with plan/usage details |
//!
//! Both are wrapped by [`Error`], so callers match on a single type and branch on
//! [`Error::kind`] instead of comparing message strings.
//!
//! # Examples
//!
//! ```
//! use whooktown::{Error, ErrorKind};
//!
//! let err = Error::from(whooktown::ApiError::new(ErrorKind::NotFound, "layout missing"));
//! assert!(err.is_not_found());
//! assert_eq!(err.to_string(), "not_found: layout missing");
//! ```

use serde_json::{Map, Value};
use std::fmt;

/// Boxed lower-level cause carried by an [`ApiError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 400
    BadRequest,
    /// 402, generic or with quota details
    QuotaExceeded,
    /// Any other status >= 400, or an undecodable success body
    InternalServer,
    /// The request never produced a complete response
    Network,
    /// The request could not be built (bad path, unserializable body)
    Validation,
    /// The caller's context was cancelled or its deadline passed
    Timeout,
}

impl ErrorKind {
    /// Stable snake_case name, as used in `Display`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::InternalServer => "internal_server",
            ErrorKind::Network => "network_error",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn caused_by(cause: &Option<BoxError>) -> String {
    match cause {
        Some(cause) => format!(" (caused by: {cause})"),
        None => String::new(),
    }
}

/// A classified failure.
///
/// `status` is set whenever the failure came from an HTTP response; `details`
/// carries the `details` object of the error body when the server sent one.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}{}", caused_by(.cause))]
pub struct ApiError {
    /// Coarse failure kind
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Originating HTTP status, if any
    pub status: Option<u16>,
    /// Structured `details` from the error body
    pub details: Option<Map<String, Value>>,
    /// Lower-level cause
    #[source]
    pub cause: Option<BoxError>,
}

impl ApiError {
    /// Create an error with a kind and message and nothing else.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
            cause: None,
        }
    }

    /// Create an error wrapping a lower-level cause.
    pub fn with_cause(
        kind: ErrorKind,
        message: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self {
            cause: Some(cause.into()),
            ..Self::new(kind, message)
        }
    }

    /// Attach the originating HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the structured details object.
    #[must_use]
    pub fn with_details(mut self, details: Option<Map<String, Value>>) -> Self {
        self.details = details;
        self
    }
}

/// A 402 with plan and usage details.
///
/// Produced only when the error body's `code` is one of the quota codes; a
/// bare 402 becomes an [`ApiError`] of kind [`ErrorKind::QuotaExceeded`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("quota_exceeded: {message} (plan: {plan}, current: {current}, limit: {limit})")]
pub struct QuotaError {
    /// Human-readable message
    pub message: String,
    /// Originating HTTP status
    pub status: u16,
    /// Plan identifier, e.g. `"free"`
    pub plan: String,
    /// Current usage
    pub current: i64,
    /// Limit of the plan
    pub limit: i64,
    /// Exceeded dimension: `"assets"` or `"layouts"`
    pub quota_type: String,
}

/// Any error returned by the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic classified error
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Quota exceeded with plan details
    #[error(transparent)]
    Quota(#[from] QuotaError),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        ApiError::with_cause(ErrorKind::Validation, message, cause).into()
    }

    pub(crate) fn network(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        ApiError::with_cause(ErrorKind::Network, message, cause).into()
    }

    pub(crate) fn timeout(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        ApiError::with_cause(ErrorKind::Timeout, message, cause).into()
    }

    /// The failure kind. Quota errors report [`ErrorKind::QuotaExceeded`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Api(e) => e.kind,
            Error::Quota(_) => ErrorKind::QuotaExceeded,
        }
    }

    /// The originating HTTP status, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(e) => e.status,
            Error::Quota(e) => Some(e.status),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Error::Api(e) => &e.message,
            Error::Quota(e) => &e.message,
        }
    }

    /// Structured details of a generic error.
    pub fn details(&self) -> Option<&Map<String, Value>> {
        match self {
            Error::Api(e) => e.details.as_ref(),
            Error::Quota(_) => None,
        }
    }

    /// The quota details, if this is the specialized quota error.
    pub fn as_quota(&self) -> Option<&QuotaError> {
        match self {
            Error::Quota(e) => Some(e),
            Error::Api(_) => None,
        }
    }

    /// 401
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    /// 403
    pub fn is_forbidden(&self) -> bool {
        self.kind() == ErrorKind::Forbidden
    }

    /// 404
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// 400
    pub fn is_bad_request(&self) -> bool {
        self.kind() == ErrorKind::BadRequest
    }

    /// True for both the generic and the detailed quota representation.
    pub fn is_quota_exceeded(&self) -> bool {
        self.kind() == ErrorKind::QuotaExceeded
    }

    /// Transport-level failure
    pub fn is_network(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    /// Cancellation or deadline
    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_without_cause() {
        let err = ApiError::new(ErrorKind::Forbidden, "nope");
        assert_eq!(err.to_string(), "forbidden: nope");
    }

    #[test]
    fn test_display_with_cause() {
        let err = ApiError::with_cause(ErrorKind::Network, "request failed", "connection reset");
        assert_eq!(
            err.to_string(),
            "network_error: request failed (caused by: connection reset)"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_quota_display_and_kind() {
        let quota = QuotaError {
            message: "too many assets".to_string(),
            status: 402,
            plan: "free".to_string(),
            current: 5,
            limit: 5,
            quota_type: "assets".to_string(),
        };
        assert_eq!(
            quota.to_string(),
            "quota_exceeded: too many assets (plan: free, current: 5, limit: 5)"
        );

        let err = Error::from(quota);
        assert!(err.is_quota_exceeded());
        assert_eq!(err.status(), Some(402));
        assert_eq!(err.as_quota().map(|q| q.limit), Some(5));
        assert!(err.details().is_none());
    }

    #[test]
    fn test_generic_quota_is_quota_exceeded() {
        let err = Error::from(ApiError::new(ErrorKind::QuotaExceeded, "quota exceeded").with_status(402));
        assert!(err.is_quota_exceeded());
        assert!(err.as_quota().is_none());
    }

    #[test]
    fn test_predicates_are_exclusive() {
        let err = Error::from(ApiError::new(ErrorKind::Timeout, "request cancelled"));
        assert!(err.is_timeout());
        assert!(!err.is_network());
        assert!(!err.is_unauthorized());
        assert_eq!(err.status(), None);
    }
}
