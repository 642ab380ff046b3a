//! Basic whooktown client example
//!
//! Logs in, sends one sensor reading and reports how the call ended.
//!
//! Run with: WHOOKTOWN_EMAIL=you@example.com cargo run --example basic
//! Set WHOOKTOWN_ENV=DEV to target the development services and
//! RUST_LOG=whooktown=debug to see retries.

use std::time::Duration;
use tracing_subscriber::EnvFilter;
use whooktown::types::{Activity, SensorData, Status, TokenType};
use whooktown::{CallContext, Client, ClientConfig, CredentialsRequest, ErrorKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Whooktown Client Basic Example");
    println!("==============================\n");

    let config = ClientConfig::default().with_retry(2, Duration::from_millis(500));
    let client = Client::new(config)?;
    let ctx = CallContext::new().with_timeout(Duration::from_secs(20));

    let email = std::env::var("WHOOKTOWN_EMAIL").unwrap_or_else(|_| "demo@example.com".to_string());
    let token = client
        .auth()
        .login(&ctx, &CredentialsRequest::new(email, TokenType::Sensor))
        .await?;
    client.set_token(&token.token);

    // Login only returns the token string; its details come from the check endpoint.
    let details = client.auth().check_token(&ctx, &token.token).await?;
    println!("Logged in, token type: {}", details.token_type);

    let reading = SensorData::new(uuid::Uuid::new_v4())
        .with_status(Status::Online)
        .with_activity(Activity::Normal)
        .with_extra("source", "demo");

    match client.sensors().send(&ctx, &reading).await {
        Ok(()) => println!("Reading sent for building {}", reading.id),
        Err(e) => match e.kind() {
            ErrorKind::QuotaExceeded => match e.as_quota() {
                Some(quota) => println!(
                    "Plan {} allows {} {} (using {})",
                    quota.plan, quota.limit, quota.quota_type, quota.current
                ),
                None => println!("Quota exceeded: {}", e.message()),
            },
            ErrorKind::Unauthorized | ErrorKind::Forbidden => println!("Token rejected: {e}"),
            ErrorKind::NotFound => println!("Unknown building: {e}"),
            ErrorKind::Timeout => println!("Gave up waiting: {e}"),
            _ => return Err(e.into()),
        },
    }

    Ok(())
}
