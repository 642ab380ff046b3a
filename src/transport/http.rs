//! The retrying JSON transport.
//!
//! A [`Transport`] serves one service base URL. Every verb goes through a
//! single execution routine that drives a [`RetryMachine`]:
//!
//! - the request is validated once (URL join, body serialization); failures
//!   here are validation errors and never reach the network
//! - each attempt snapshots the credentials, sends, drains the full body and
//!   either classifies a failure status or decodes the result
//! - client errors (4xx) stop the call, server and network errors are retried
//!   after `retry_wait * attempt`
//! - the caller's [`CallContext`] is raced against both the attempt and the
//!   backoff wait; when it finishes first the call returns a timeout error
//!
//! # Examples
//!
//! ```ignore
//! use whooktown::transport::{CallContext, Transport, TransportConfig, NO_BODY};
//!
//! #[tokio::main]
//! async fn main() -> whooktown::Result<()> {
//!     let transport = Transport::with_config("https://api.whook.town", TransportConfig::default())?;
//!     transport.set_token("app-token");
//!
//!     let ctx = CallContext::new();
//!     let roles: Option<serde_json::Value> = transport.fetch(&ctx, "/auth/roles").await?;
//!     transport.remove(&ctx, "/account/token/abc").await?;
//!     let _: Option<serde_json::Value> = transport.submit(&ctx, "/auth/logout", NO_BODY).await?;
//!     Ok(())
//! }
//! ```

use super::classifier::classify;
use super::context::{CallContext, CancelCause};
use super::credentials::Credentials;
use super::retry::{
    is_retryable, Finish, RetryMachine, RetryPolicy, RetryState, Transition, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_WAIT,
};
use crate::error::{ApiError, Error, ErrorKind, Result};
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Media type sent in `Content-Type` and `Accept`.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Header carrying the admin credential.
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Typed "no request body", for verbs that take an optional body.
pub const NO_BODY: Option<&()> = None;

/// Default request timeout of a transport-built engine.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings of one transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Base backoff delay
    pub retry_wait: Duration,
    /// Per-request timeout of an engine built by the transport itself
    pub request_timeout: Duration,
    /// Log every attempt at debug level
    pub debug: bool,
}

impl TransportConfig {
    /// Retry policy derived from this configuration.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_wait)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_wait: DEFAULT_RETRY_WAIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            debug: false,
        }
    }
}

const PATH_ROOT: &str = "http://path.invalid/";

/// Append `segments` to `prefix`, percent-encoding each one.
///
/// Identifiers that contain `/`, `?`, `#` or `%` stay inside their own
/// segment instead of changing the target resource.
///
/// ```
/// use whooktown::transport::segment_path;
///
/// let path = segment_path("/account/token", &["abc#def"]).unwrap();
/// assert_eq!(path, "/account/token/abc%23def");
/// ```
pub fn segment_path(prefix: &str, segments: &[&str]) -> Result<String> {
    let invalid = || format!("invalid path: {prefix}");
    let mut url = Url::parse(PATH_ROOT)
        .and_then(|root| root.join(prefix))
        .map_err(|e| Error::validation(invalid(), e))?;
    url.path_segments_mut()
        .map_err(|()| Error::from(ApiError::new(ErrorKind::Validation, invalid())))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Build a pooled HTTP engine.
pub fn build_engine(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| Error::network("failed to build http engine", e))
}

/// Whether a successful body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// Drain and discard the body
    Skip,
    /// Decode a non-empty body as JSON
    Json,
}

/// One logical request: verb, path relative to the base URL, serialized body.
#[derive(Debug, Clone)]
pub struct RequestDescriptor<'a> {
    /// HTTP method
    pub method: Method,
    /// Path appended to the base URL
    pub path: &'a str,
    /// JSON payload
    pub body: Option<Bytes>,
}

impl<'a> RequestDescriptor<'a> {
    /// A request without a body.
    pub fn new(method: Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            body: None,
        }
    }

    /// Serialize `body` as the JSON payload.
    ///
    /// Fails with a validation error if the value cannot be serialized.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: Option<&B>) -> Result<Self> {
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| Error::validation("failed to marshal request body", e))?;
            self.body = Some(Bytes::from(bytes));
        }
        Ok(self)
    }
}

enum AttemptOutcome<T> {
    Completed(Result<Option<T>>),
    Cancelled(CancelCause),
}

/// HTTP transport for one service.
///
/// Clones share the engine, the base URL and the credentials; rotating a token
/// on one clone is visible on all of them.
#[derive(Debug, Clone)]
pub struct Transport {
    engine: reqwest::Client,
    base_url: Arc<str>,
    credentials: Arc<Credentials>,
    config: TransportConfig,
}

impl Transport {
    /// Transport with default settings and its own engine.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, TransportConfig::default())
    }

    /// Transport with custom settings and its own engine.
    pub fn with_config(base_url: &str, config: TransportConfig) -> Result<Self> {
        let engine = build_engine(config.request_timeout)?;
        Ok(Self::with_engine(engine, base_url, config))
    }

    /// Transport on an existing engine.
    ///
    /// Trailing slashes of `base_url` are stripped.
    pub fn with_engine(engine: reqwest::Client, base_url: &str, config: TransportConfig) -> Self {
        Self {
            engine,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            credentials: Arc::new(Credentials::new()),
            config,
        }
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Transport settings.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Shared credential store.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Set the bearer token. An empty string clears it.
    pub fn set_token(&self, token: &str) {
        self.credentials.set_bearer(token);
    }

    /// Set the `X-Admin-Token` value. An empty string clears it.
    pub fn set_admin_token(&self, token: &str) {
        self.credentials.set_admin(token);
    }

    /// Remove the bearer token.
    pub fn clear_token(&self) {
        self.credentials.set_bearer("");
    }

    /// GET `path`, decoding the body if there is one.
    pub async fn fetch<T: DeserializeOwned>(&self, ctx: &CallContext, path: &str) -> Result<Option<T>> {
        let request = RequestDescriptor::new(Method::GET, path);
        self.execute(ctx, &request, Decode::Json).await
    }

    /// POST `body` to `path` (create).
    pub async fn submit<B, T>(&self, ctx: &CallContext, path: &str, body: Option<&B>) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::new(Method::POST, path).with_json(body)?;
        self.execute(ctx, &request, Decode::Json).await
    }

    /// PUT `body` to `path` (replace).
    pub async fn replace<B, T>(&self, ctx: &CallContext, path: &str, body: Option<&B>) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::new(Method::PUT, path).with_json(body)?;
        self.execute(ctx, &request, Decode::Json).await
    }

    /// PATCH `body` to `path` (partial update).
    pub async fn amend<B, T>(&self, ctx: &CallContext, path: &str, body: Option<&B>) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::new(Method::PATCH, path).with_json(body)?;
        self.execute(ctx, &request, Decode::Json).await
    }

    /// DELETE `path`.
    pub async fn remove(&self, ctx: &CallContext, path: &str) -> Result<()> {
        let request = RequestDescriptor::new(Method::DELETE, path);
        self.execute::<()>(ctx, &request, Decode::Skip).await.map(|_| ())
    }

    /// Send a request whose response body is not wanted.
    pub async fn dispatch<B>(&self, ctx: &CallContext, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let request = RequestDescriptor::new(method, path).with_json(body)?;
        self.execute::<()>(ctx, &request, Decode::Skip).await.map(|_| ())
    }

    /// Run a request under the retry policy.
    ///
    /// Returns `Ok(None)` when decoding was skipped or the body was empty.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: &RequestDescriptor<'_>,
        decode: Decode,
    ) -> Result<Option<T>> {
        let url = self.endpoint(request.path)?;
        let mut machine = RetryMachine::new(self.config.policy());
        let mut last_error: Option<Error> = None;
        let mut state = machine.apply(Transition::Start);

        loop {
            state = match state {
                RetryState::Idle => machine.apply(Transition::Start),

                RetryState::Attempting { attempt } => {
                    let outcome = tokio::select! {
                        biased;
                        cause = ctx.done() => AttemptOutcome::Cancelled(cause),
                        result = self.attempt::<T>(&url, request, decode, attempt) => {
                            AttemptOutcome::Completed(result)
                        }
                    };

                    match outcome {
                        AttemptOutcome::Completed(Ok(value)) => {
                            machine.apply(Transition::Success);
                            return Ok(value);
                        }
                        AttemptOutcome::Completed(Err(err)) => {
                            let transition = if is_retryable(&err) {
                                Transition::RetryableFailure
                            } else {
                                Transition::NonRetryableFailure
                            };
                            last_error = Some(err);
                            machine.apply(transition)
                        }
                        AttemptOutcome::Cancelled(cause) => {
                            last_error = Some(Error::timeout("request cancelled", cause));
                            machine.apply(Transition::Cancelled)
                        }
                    }
                }

                RetryState::Backoff { attempt, delay } => {
                    if let Some(err) = &last_error {
                        tracing::warn!(
                            method = %request.method,
                            path = request.path,
                            attempt,
                            ?delay,
                            error = %err,
                            "request failed, retrying"
                        );
                    }

                    tokio::select! {
                        biased;
                        cause = ctx.done() => {
                            last_error = Some(Error::timeout("request cancelled", cause));
                            machine.apply(Transition::Cancelled)
                        }
                        _ = tokio::time::sleep(delay) => machine.apply(Transition::BackoffElapsed),
                    }
                }

                RetryState::Done(finish) => {
                    if finish == Finish::Exhausted {
                        tracing::debug!(
                            method = %request.method,
                            path = request.path,
                            attempts = machine.policy().total_attempts(),
                            "retries exhausted"
                        );
                    }
                    return Err(last_error.unwrap_or_else(|| {
                        ApiError::new(ErrorKind::InternalServer, "request finished without a result").into()
                    }));
                }
            };
        }
    }

    /// Join `path` to the base URL.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = if path.is_empty() || path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Url::parse(&joined).map_err(|e| Error::validation(format!("invalid path: {path}"), e))
    }

    /// A single attempt.
    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &Url,
        request: &RequestDescriptor<'_>,
        decode: Decode,
        attempt: u32,
    ) -> Result<Option<T>> {
        let credentials = self.credentials.snapshot();

        let mut builder = self
            .engine
            .request(request.method.clone(), url.clone())
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .header(ACCEPT, JSON_MEDIA_TYPE);
        if let Some(token) = &credentials.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(admin) = &credentials.admin {
            builder = builder.header(ADMIN_TOKEN_HEADER, &**admin);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let http_request = builder
            .build()
            .map_err(|e| Error::validation("failed to create request", e))?;

        if self.config.debug {
            tracing::debug!(method = %request.method, %url, attempt, "sending request");
        }

        let response = self
            .engine
            .execute(http_request)
            .await
            .map_err(|e| Error::network("request failed", e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::network("failed to read response body", e))?;

        if self.config.debug {
            tracing::debug!(method = %request.method, %url, attempt, status, bytes = body.len(), "received response");
        }

        if status >= 400 {
            return Err(classify(status, &body));
        }

        match decode {
            Decode::Json if !body.is_empty() => serde_json::from_slice(&body).map(Some).map_err(|e| {
                Error::from(
                    ApiError::with_cause(ErrorKind::InternalServer, "failed to parse response", e)
                        .with_status(status),
                )
            }),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> Transport {
        Transport::with_engine(reqwest::Client::new(), base, TransportConfig::default())
    }

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_wait, Duration::from_secs(1));
        assert!(!config.debug);
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let t = transport("https://api.whook.town/");
        assert_eq!(t.base_url(), "https://api.whook.town");
    }

    #[test]
    fn test_endpoint_join() {
        let t = transport("https://api.whook.town/v1/");
        assert_eq!(
            t.endpoint("/layouts").unwrap().as_str(),
            "https://api.whook.town/v1/layouts"
        );
        assert_eq!(
            t.endpoint("layouts?archived=true").unwrap().as_str(),
            "https://api.whook.town/v1/layouts?archived=true"
        );
    }

    #[test]
    fn test_invalid_base_is_validation_error() {
        let t = transport("not a url");
        let err = t.endpoint("/x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "invalid path: /x");
    }

    #[test]
    fn test_segment_path_escapes_identifiers() {
        assert_eq!(
            segment_path("/account/token", &["abc#def"]).unwrap(),
            "/account/token/abc%23def"
        );
        assert_eq!(
            segment_path("/api/tokens", &["a/b?c=1"]).unwrap(),
            "/api/tokens/a%2Fb%3Fc=1"
        );
        assert_eq!(
            segment_path("/ui/scene/", &["s 1", "state"]).unwrap(),
            "/ui/scene/s%201/state"
        );
        assert_eq!(segment_path("/auth/roles", &[]).unwrap(), "/auth/roles");
    }

    #[test]
    fn test_descriptor_serializes_body() {
        let request = RequestDescriptor::new(Method::POST, "/sensors")
            .with_json(Some(&serde_json::json!({"status": "online"})))
            .unwrap();
        assert_eq!(request.body.as_deref(), Some(&br#"{"status":"online"}"#[..]));

        let request = RequestDescriptor::new(Method::POST, "/sensors")
            .with_json(NO_BODY)
            .unwrap();
        assert!(request.body.is_none());
    }

    #[test]
    fn test_descriptor_rejects_unserializable_body() {
        let mut bad = std::collections::HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON object keys");
        let err = RequestDescriptor::new(Method::POST, "/x")
            .with_json(Some(&bad))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_clones_share_credentials() {
        let t = transport("https://api.whook.town");
        let clone = t.clone();
        t.set_token("abc");
        t.set_admin_token("secret");
        assert_eq!(clone.credentials().bearer().as_deref(), Some("abc"));
        assert_eq!(clone.credentials().admin().as_deref(), Some("secret"));

        clone.clear_token();
        assert!(t.credentials().bearer().is_none());
    }
}
