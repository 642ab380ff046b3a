//! Client configuration.
//!
//! [`ClientConfig`] gathers everything [`crate::Client::new`] needs: the base
//! URL of every service, credentials, and the HTTP settings shared by all
//! transports.
//!
//! The default configuration targets production unless the `WHOOKTOWN_ENV`
//! environment variable is `DEV`.
//!
//! # Examples
//!
//! ```
//! use whooktown::{ClientConfig, Environment};
//! use std::time::Duration;
//!
//! let config = ClientConfig::for_environment(Environment::Development)
//!     .with_token("app-token")
//!     .with_retry(5, Duration::from_millis(500));
//!
//! assert_eq!(config.urls.auth, "https://auth.dev.whook.town");
//! assert_eq!(config.max_retries, 5);
//!
//! let config = ClientConfig {
//!     debug: true,
//!     ..ClientConfig::for_environment(Environment::Production)
//! };
//! assert!(config.debug);
//! ```

use crate::transport::{TransportConfig, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_WAIT};
use std::time::Duration;

/// Environment variable selecting the deployment.
pub const ENVIRONMENT_VAR: &str = "WHOOKTOWN_ENV";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// `PROD`
    #[default]
    Production,
    /// `DEV`
    Development,
}

impl Environment {
    /// Parse an environment name. Only `DEV` selects development.
    pub fn parse(value: &str) -> Self {
        if value == "DEV" {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    /// Read [`ENVIRONMENT_VAR`].
    pub fn from_env() -> Self {
        std::env::var(ENVIRONMENT_VAR)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    /// `PROD` or `DEV`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "PROD",
            Environment::Development => "DEV",
        }
    }
}

/// Base URL of every service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrls {
    /// Authentication and account service
    pub auth: String,
    /// Sensor ingestion
    pub sensor: String,
    /// Layout and UI control
    pub ui: String,
    /// Workflow engine
    pub workflow: String,
    /// Admin backoffice
    pub backoffice: String,
    /// Server-sent events
    pub sse: String,
    /// Subscription service
    pub subscription: String,
    /// Audio streaming
    pub audio_stream: String,
}

impl ServiceUrls {
    /// Production URLs.
    pub fn production() -> Self {
        Self {
            auth: "https://auth.whook.town".to_string(),
            sensor: "https://sensors.whook.town".to_string(),
            ui: "https://api.whook.town".to_string(),
            workflow: "https://api.whook.town".to_string(),
            backoffice: "https://admin.whook.town".to_string(),
            sse: "https://ws.whook.town".to_string(),
            subscription: "https://subscription.whook.town".to_string(),
            audio_stream: "https://stream.whook.town".to_string(),
        }
    }

    /// Development URLs.
    pub fn development() -> Self {
        Self {
            auth: "https://auth.dev.whook.town".to_string(),
            sensor: "https://sensors.dev.whook.town".to_string(),
            ui: "https://api.dev.whook.town".to_string(),
            workflow: "https://api.dev.whook.town".to_string(),
            backoffice: "https://admin.dev.whook.town".to_string(),
            sse: "https://ws.dev.whook.town".to_string(),
            subscription: "https://subscription.dev.whook.town".to_string(),
            audio_stream: "https://stream.dev.whook.town".to_string(),
        }
    }

    /// URLs of an environment.
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
    }

    /// Every service on one URL, for custom deployments.
    pub fn uniform(base_url: &str) -> Self {
        Self {
            auth: base_url.to_string(),
            sensor: base_url.to_string(),
            ui: base_url.to_string(),
            workflow: base_url.to_string(),
            backoffice: base_url.to_string(),
            sse: base_url.to_string(),
            subscription: base_url.to_string(),
            audio_stream: base_url.to_string(),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URLs
    pub urls: ServiceUrls,
    /// Bearer token for user authentication
    pub token: String,
    /// Admin secret for the backoffice (`X-Admin-Token`)
    pub admin_secret: String,
    /// Per-request timeout of the built engine
    pub timeout: Duration,
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Base backoff delay
    pub retry_wait: Duration,
    /// Pre-built engine; when set, `timeout` is not applied
    pub engine: Option<reqwest::Client>,
    /// Log every attempt at debug level
    pub debug: bool,
}

impl ClientConfig {
    /// Defaults for an environment.
    pub fn for_environment(env: Environment) -> Self {
        Self {
            urls: ServiceUrls::for_environment(env),
            token: String::new(),
            admin_secret: String::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_wait: DEFAULT_RETRY_WAIT,
            engine: None,
            debug: false,
        }
    }

    /// Switch every URL to an environment's presets.
    #[must_use]
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.urls = ServiceUrls::for_environment(env);
        self
    }

    /// Point every service at one URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.urls = ServiceUrls::uniform(base_url);
        self
    }

    /// Bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Admin secret.
    #[must_use]
    pub fn with_admin_secret(mut self, secret: impl Into<String>) -> Self {
        self.admin_secret = secret.into();
        self
    }

    /// Engine request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry count and base delay.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, retry_wait: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_wait = retry_wait;
        self
    }

    /// Inject a pre-built engine.
    #[must_use]
    pub fn with_engine(mut self, engine: reqwest::Client) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Debug logging.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Settings applied to every service transport.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            max_retries: self.max_retries,
            retry_wait: self.retry_wait,
            request_timeout: self.timeout,
            debug: self.debug,
        }
    }
}

impl Default for ClientConfig {
    /// Configuration for the environment named by `WHOOKTOWN_ENV`.
    fn default() -> Self {
        Self::for_environment(Environment::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("DEV"), Environment::Development);
        assert_eq!(Environment::parse("PROD"), Environment::Production);
        assert_eq!(Environment::parse("dev"), Environment::Production);
        assert_eq!(Environment::parse(""), Environment::Production);
    }

    #[test]
    fn test_production_defaults() {
        let config = ClientConfig::for_environment(Environment::Production);
        assert_eq!(config.urls.sensor, "https://sensors.whook.town");
        assert_eq!(config.urls.backoffice, "https://admin.whook.town");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_wait, Duration::from_secs(1));
        assert!(config.engine.is_none());
    }

    #[test]
    fn test_base_url_overrides_all() {
        let config = ClientConfig::for_environment(Environment::Production)
            .with_base_url("http://localhost:8080");
        assert_eq!(config.urls, ServiceUrls::uniform("http://localhost:8080"));
    }

    #[test]
    fn test_transport_config() {
        let config = ClientConfig::for_environment(Environment::Production)
            .with_retry(1, Duration::from_millis(5))
            .with_debug(true);
        let transport = config.transport_config();
        assert_eq!(transport.max_retries, 1);
        assert_eq!(transport.retry_wait, Duration::from_millis(5));
        assert!(transport.debug);
    }
}
