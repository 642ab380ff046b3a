//! Whooktown service clients.
//!
//! [`Client`] owns one HTTP engine and builds a [`Transport`] per service on
//! top of it. Each service wrapper only knows its endpoints; retries,
//! cancellation and error classification all happen in the transport.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── auth        - signup, login, token management
//! ├── sensors     - sensor readings, camera, traffic
//! ├── ui          - layouts, quota, connected scenes
//! └── backoffice  - admin API (X-Admin-Token)
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Entry point holding every service transport |
//! | [`AuthClient`] | Auth service |
//! | [`SensorsClient`] | Sensor ingestion |
//! | [`UiClient`] | Layouts and plan quota |
//! | [`BackofficeClient`] | Admin backoffice |
//!
//! # Credentials
//!
//! The bearer token is shared by the auth, sensor, UI and workflow transports
//! and rotated on all of them by [`Client::set_token`]. The backoffice
//! transport only ever sends the admin secret.
//!
//! # Examples
//!
//! ```
//! use whooktown::{Client, ClientConfig, Environment};
//!
//! let config = ClientConfig::for_environment(Environment::Development)
//!     .with_base_url("http://localhost:8080")
//!     .with_token("app-token");
//! let client = Client::new(config).unwrap();
//!
//! assert_eq!(client.ui().transport().base_url(), "http://localhost:8080");
//! client.set_token("rotated");
//! assert_eq!(client.workflow().credentials().bearer().as_deref(), Some("rotated"));
//! ```

mod auth;
mod backoffice;
mod sensors;
mod ui;

pub use auth::{AuthClient, CreateTokenRequest, CredentialsRequest};
pub use backoffice::{
    BackofficeClient, CreateAccountRequest, CreateAccountTokenRequest, UpdateAccountRequest,
};
pub use sensors::SensorsClient;
pub use ui::{SceneStateRequest, UiClient};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::transport::{build_engine, Transport};
use parking_lot::RwLock;
use std::sync::Arc;

/// Entry point to every Whooktown service.
///
/// Cheap to clone; clones share transports, credentials and configuration.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<RwLock<ClientConfig>>,
    auth: AuthClient,
    sensors: SensorsClient,
    backoffice: BackofficeClient,
    ui: UiClient,
    workflow: Transport,
    bearer: Arc<[Transport]>,
}

impl Client {
    /// Build a client from a configuration.
    ///
    /// Uses `config.engine` when present, otherwise builds one engine with
    /// `config.timeout` that every service shares.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let engine = match &config.engine {
            Some(engine) => engine.clone(),
            None => build_engine(config.timeout)?,
        };
        let settings = config.transport_config();
        let service = |base_url: &str| Transport::with_engine(engine.clone(), base_url, settings);

        let auth = service(&config.urls.auth);
        let sensors = service(&config.urls.sensor);
        let ui = service(&config.urls.ui);
        let workflow = service(&config.urls.workflow);
        let bearer: Arc<[Transport]> =
            Arc::from(vec![auth.clone(), sensors.clone(), ui.clone(), workflow.clone()]);
        for t in bearer.iter() {
            t.set_token(&config.token);
        }

        let backoffice = service(&config.urls.backoffice);
        backoffice.set_admin_token(&config.admin_secret);

        tracing::debug!(
            auth = %config.urls.auth,
            sensor = %config.urls.sensor,
            backoffice = %config.urls.backoffice,
            "whooktown client created"
        );

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            auth: AuthClient::new(auth),
            sensors: SensorsClient::new(sensors),
            backoffice: BackofficeClient::new(backoffice),
            ui: UiClient::new(ui),
            workflow,
            bearer,
        })
    }

    /// Client configured from the environment (`WHOOKTOWN_ENV`).
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Auth service.
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Sensor ingestion.
    pub fn sensors(&self) -> &SensorsClient {
        &self.sensors
    }

    /// Admin backoffice.
    pub fn backoffice(&self) -> &BackofficeClient {
        &self.backoffice
    }

    /// UI service.
    pub fn ui(&self) -> &UiClient {
        &self.ui
    }

    /// Raw transport of the workflow service.
    pub fn workflow(&self) -> &Transport {
        &self.workflow
    }

    /// Rotate the bearer token on every user-facing service.
    ///
    /// Calls already in flight finish with the token they started with.
    pub fn set_token(&self, token: &str) {
        for t in self.bearer.iter() {
            t.set_token(token);
        }
        self.config.write().token = token.to_string();
    }

    /// Rotate the backoffice admin secret.
    pub fn set_admin_secret(&self, secret: &str) {
        self.backoffice.set_admin_token(secret);
        self.config.write().admin_secret = secret.to_string();
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ClientConfig {
        self.config.read().clone()
    }
}
