//! Failure response classification.
//!
//! Turns a terminal status (>= 400) and the raw response body into exactly one
//! [`Error`]. Classification happens in two steps:
//!
//! 1. [`ErrorBody::parse`] reads the body without judging it. Each field is
//!    reported as present, absent, or present with the wrong JSON type.
//! 2. [`classify`] applies policy: message precedence, quota detection, the
//!    status-to-kind mapping and the default messages.
//!
//! Malformed bodies never fail classification; they only lose detail.
//!
//! # Examples
//!
//! ```
//! use whooktown::transport::classify;
//! use whooktown::ErrorKind;
//!
//! let err = classify(404, b"");
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! assert_eq!(err.message(), "not found");
//!
//! let err = classify(402, br#"{"code":"LAYOUT_QUOTA_EXCEEDED","details":{"limit":3}}"#);
//! assert_eq!(err.as_quota().map(|q| q.limit), Some(3));
//! ```

use crate::error::{ApiError, Error, ErrorKind, QuotaError};
use serde_json::{Map, Value};

/// Error codes that select the detailed quota error.
pub const QUOTA_CODES: [&str; 3] = [
    "QUOTA_EXCEEDED",
    "ASSET_QUOTA_EXCEEDED",
    "LAYOUT_QUOTA_EXCEEDED",
];

/// One field of a loosely-typed JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// Key not present (or `null`)
    Absent,
    /// Key present with an unexpected JSON type
    WrongType,
    /// Key present with the expected type
    Present(T),
}

impl<T> Field<T> {
    /// The value if present.
    pub fn present(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Absent | Field::WrongType => None,
        }
    }

    /// Borrowing version of [`Field::present`].
    pub fn as_present(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Absent | Field::WrongType => None,
        }
    }

    fn lookup(object: &Map<String, Value>, key: &str, extract: impl FnOnce(&Value) -> Option<T>) -> Self {
        match object.get(key) {
            None | Some(Value::Null) => Field::Absent,
            Some(value) => extract(value).map_or(Field::WrongType, Field::Present),
        }
    }
}

fn string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn integer(value: &Value) -> Option<i64> {
    value.as_f64().map(|n| n.trunc() as i64)
}

/// Parsed shape of an error response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// Body is empty or JSON `null`
    Empty,
    /// Body is not a JSON object; kept verbatim as text
    Text(String),
    /// Body is a JSON object
    Object {
        /// `message`
        message: Field<String>,
        /// `error`
        error: Field<String>,
        /// `code`
        code: Field<String>,
        /// `details`
        details: Field<Map<String, Value>>,
    },
}

impl ErrorBody {
    /// Parse a raw body. Never fails.
    pub fn parse(body: &[u8]) -> Self {
        if body.is_empty() {
            return ErrorBody::Empty;
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Null) => ErrorBody::Empty,
            Ok(Value::Object(object)) => ErrorBody::Object {
                message: Field::lookup(&object, "message", string),
                error: Field::lookup(&object, "error", string),
                code: Field::lookup(&object, "code", string),
                details: Field::lookup(&object, "details", |v| v.as_object().cloned()),
            },
            _ => ErrorBody::Text(String::from_utf8_lossy(body).into_owned()),
        }
    }

    /// Message extracted from the body: `message`, then `error`, then raw text.
    ///
    /// An empty string counts as no message.
    pub fn message(&self) -> Option<&str> {
        let found = match self {
            ErrorBody::Empty => None,
            ErrorBody::Text(text) => Some(text.as_str()),
            ErrorBody::Object { message, error, .. } => message
                .as_present()
                .filter(|m| !m.is_empty())
                .or_else(|| error.as_present())
                .map(String::as_str),
        };
        found.filter(|m| !m.is_empty())
    }

    /// The `code` field, if it is a string.
    pub fn code(&self) -> Option<&str> {
        match self {
            ErrorBody::Object { code, .. } => code.as_present().map(String::as_str),
            _ => None,
        }
    }

    /// The `details` object, if it is an object.
    pub fn details(&self) -> Option<&Map<String, Value>> {
        match self {
            ErrorBody::Object { details, .. } => details.as_present(),
            _ => None,
        }
    }
}

/// Plan and usage fields of a quota `details` object.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaDetails {
    /// `plan`
    pub plan: Field<String>,
    /// `current`, truncated to an integer
    pub current: Field<i64>,
    /// `limit`, truncated to an integer
    pub limit: Field<i64>,
    /// `type`
    pub quota_type: Field<String>,
}

impl QuotaDetails {
    /// Read the quota fields from a details object.
    pub fn parse(details: Option<&Map<String, Value>>) -> Self {
        match details {
            Some(details) => QuotaDetails {
                plan: Field::lookup(details, "plan", string),
                current: Field::lookup(details, "current", integer),
                limit: Field::lookup(details, "limit", integer),
                quota_type: Field::lookup(details, "type", string),
            },
            None => QuotaDetails {
                plan: Field::Absent,
                current: Field::Absent,
                limit: Field::Absent,
                quota_type: Field::Absent,
            },
        }
    }
}

/// Map a status code to its kind.
pub fn kind_for_status(status: u16) -> ErrorKind {
    match status {
        401 => ErrorKind::Unauthorized,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        400 => ErrorKind::BadRequest,
        402 => ErrorKind::QuotaExceeded,
        _ => ErrorKind::InternalServer,
    }
}

/// Message used when the body provided none.
pub fn default_message(kind: ErrorKind, status: u16) -> String {
    match kind {
        ErrorKind::Unauthorized => "unauthorized".to_string(),
        ErrorKind::Forbidden => "forbidden".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::BadRequest => "bad request".to_string(),
        ErrorKind::QuotaExceeded => "quota exceeded".to_string(),
        _ => format!("server error: {status}"),
    }
}

/// Classify a failure response.
pub fn classify(status: u16, body: &[u8]) -> Error {
    let parsed = ErrorBody::parse(body);
    let message = parsed.message().map(str::to_string);

    if parsed.code().is_some_and(|code| QUOTA_CODES.contains(&code)) {
        let details = QuotaDetails::parse(parsed.details());
        // The message is copied verbatim, even when the body had none.
        return QuotaError {
            message: message.unwrap_or_default(),
            status,
            plan: details.plan.present().unwrap_or_default(),
            current: details.current.present().unwrap_or_default(),
            limit: details.limit.present().unwrap_or_default(),
            quota_type: details.quota_type.present().unwrap_or_default(),
        }
        .into();
    }

    let kind = kind_for_status(status);
    let message = message.unwrap_or_else(|| default_message(kind, status));
    let details = match parsed {
        ErrorBody::Object { details, .. } => details.present(),
        _ => None,
    };

    ApiError::new(kind, message)
        .with_status(status)
        .with_details(details)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_default_messages_for_client_errors() {
        let cases = [
            (401, ErrorKind::Unauthorized, "unauthorized"),
            (403, ErrorKind::Forbidden, "forbidden"),
            (404, ErrorKind::NotFound, "not found"),
            (400, ErrorKind::BadRequest, "bad request"),
        ];

        for (status, kind, message) in cases {
            let err = classify(status, &body(json!({"code": "SOMETHING"})));
            assert_eq!(err.kind(), kind, "status {status}");
            assert_eq!(err.message(), message);
            assert_eq!(err.status(), Some(status));
        }
    }

    #[test]
    fn test_server_error_default_message() {
        let err = classify(503, b"");
        assert_eq!(err.kind(), ErrorKind::InternalServer);
        assert_eq!(err.message(), "server error: 503");
    }

    #[test]
    fn test_message_precedence() {
        let err = classify(400, &body(json!({"message": "bad name", "error": "other"})));
        assert_eq!(err.message(), "bad name");

        let err = classify(400, &body(json!({"error": "invalid email"})));
        assert_eq!(err.message(), "invalid email");

        let err = classify(400, &body(json!({"message": "", "error": "fallback"})));
        assert_eq!(err.message(), "fallback");
    }

    #[test]
    fn test_plain_text_body_becomes_message() {
        let err = classify(502, b"upstream unavailable");
        assert_eq!(err.kind(), ErrorKind::InternalServer);
        assert_eq!(err.message(), "upstream unavailable");
    }

    #[test]
    fn test_non_object_json_is_text() {
        let err = classify(404, b"[1,2]");
        assert_eq!(err.message(), "[1,2]");
    }

    #[test]
    fn test_asset_quota_details() {
        let err = classify(
            402,
            &body(json!({
                "message": "asset quota reached",
                "code": "ASSET_QUOTA_EXCEEDED",
                "details": {"plan": "free", "current": 5, "limit": 5, "type": "assets"}
            })),
        );

        let quota = err.as_quota().expect("detailed quota error");
        assert_eq!(quota.plan, "free");
        assert_eq!(quota.current, 5);
        assert_eq!(quota.limit, 5);
        assert_eq!(quota.quota_type, "assets");
        assert_eq!(quota.status, 402);
        assert_eq!(quota.message, "asset quota reached");
    }

    #[test]
    fn test_bare_402_is_generic_quota() {
        let err = classify(402, &body(json!({"message": "pay up"})));
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
        assert!(err.as_quota().is_none());
        assert!(err.details().is_none());
        assert_eq!(err.message(), "pay up");
    }

    #[test]
    fn test_quota_code_wins_over_status() {
        let err = classify(403, &body(json!({"code": "QUOTA_EXCEEDED"})));
        let quota = err.as_quota().expect("detailed quota error");
        assert_eq!(quota.status, 403);
        assert_eq!(quota.plan, "");
        assert_eq!(quota.limit, 0);
        assert_eq!(quota.message, "");
    }

    #[test]
    fn test_null_body_uses_status_default() {
        assert_eq!(ErrorBody::parse(b"null"), ErrorBody::Empty);

        let err = classify(500, b"null");
        assert_eq!(err.kind(), ErrorKind::InternalServer);
        assert_eq!(err.message(), "server error: 500");

        let err = classify(404, b" null ");
        assert_eq!(err.message(), "not found");
    }

    #[test]
    fn test_quota_fields_truncate_and_tolerate_wrong_types() {
        let err = classify(
            402,
            &body(json!({
                "code": "LAYOUT_QUOTA_EXCEEDED",
                "details": {"plan": 7, "current": 2.9, "limit": "ten", "type": "layouts"}
            })),
        );
        let quota = err.as_quota().expect("detailed quota error");
        assert_eq!(quota.plan, "");
        assert_eq!(quota.current, 2);
        assert_eq!(quota.limit, 0);
        assert_eq!(quota.quota_type, "layouts");
    }

    #[test]
    fn test_generic_error_keeps_details() {
        let err = classify(400, &body(json!({"message": "invalid", "details": {"field": "email"}})));
        let details = err.details().expect("details");
        assert_eq!(details.get("field"), Some(&json!("email")));
    }

    #[test]
    fn test_parse_reports_wrong_type() {
        let parsed = ErrorBody::parse(&body(json!({"message": 12, "details": "x"})));
        match parsed {
            ErrorBody::Object { message, error, details, .. } => {
                assert_eq!(message, Field::WrongType);
                assert_eq!(error, Field::Absent);
                assert_eq!(details, Field::WrongType);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn test_quota_details_parse_absent() {
        let details = QuotaDetails::parse(None);
        assert_eq!(details.plan, Field::Absent);
        assert_eq!(details.current, Field::Absent);
    }
}
