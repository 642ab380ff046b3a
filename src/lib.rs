#![warn(missing_docs)]

//! # Whooktown: Rust SDK for the Whooktown platform
//!
//! This crate talks to the Whooktown services (auth, sensor ingestion, UI
//! layouts, workflow and the admin backoffice) over JSON/HTTP.
//!
//! ## Overview
//!
//! Every service call goes through a resilient [`transport`]:
//!
//! 1. **Retries** - server and network failures are retried with linear backoff
//! 2. **Cancellation** - each call takes a [`CallContext`] with a cancellation
//!    token and an optional deadline, honored during attempts and waits
//! 3. **Error taxonomy** - failure responses become [`Error`] values with a
//!    [`ErrorKind`], including structured [`QuotaError`]s for plan limits
//! 4. **Credentials** - bearer and admin tokens can be rotated while calls run
//!
//! ## Usage
//!
//! ```ignore
//! use whooktown::types::{SensorData, Status, TokenType};
//! use whooktown::{CallContext, Client, ClientConfig, CredentialsRequest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> whooktown::Result<()> {
//!     let client = Client::new(ClientConfig::default())?;
//!     let ctx = CallContext::new().with_timeout(Duration::from_secs(10));
//!
//!     let token = client
//!         .auth()
//!         .login(&ctx, &CredentialsRequest::new("ada@example.com", TokenType::Sensor))
//!         .await?;
//!     client.set_token(&token.token);
//!
//!     let reading = SensorData::new(uuid::Uuid::new_v4()).with_status(Status::Online);
//!     match client.sensors().send(&ctx, &reading).await {
//!         Ok(()) => {}
//!         Err(e) if e.is_quota_exceeded() => eprintln!("plan limit: {e}"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[client]** - Service clients (auth, sensors, UI, backoffice) and the [`Client`] entry point
//! - **[config]** - Environments, service URLs and [`ClientConfig`]
//! - **[error]** - Error types and result handling
//! - **[transport]** - Retrying HTTP transport, retry state machine, classification
//! - **[types]** - Request and response models

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{
    AuthClient, BackofficeClient, Client, CredentialsRequest, SensorsClient, UiClient,
};
pub use config::{ClientConfig, Environment, ServiceUrls};
pub use error::{ApiError, Error, ErrorKind, QuotaError, Result};
pub use transport::{CallContext, CancelCause, RetryPolicy, Transport, TransportConfig};
