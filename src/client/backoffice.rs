//! Admin backoffice endpoints.
//!
//! Every request carries the admin secret in `X-Admin-Token`; the bearer
//! token is not used here.

use crate::error::Result;
use crate::transport::{segment_path, CallContext, Transport, NO_BODY};
use crate::types::{
    Account, AssetTypeConfig, LayoutRecord, Plan, Stats, Subscription, SubscriptionStats, Token,
    TokenType,
};
use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Body of `POST /api/accounts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAccountRequest {
    /// Account email
    pub email: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Type of the initial token
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// Body of `PUT /api/accounts/{id}`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateAccountRequest {
    /// New email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New validation flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated: Option<bool>,
}

/// Body of `POST /api/accounts/{id}/tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAccountTokenRequest {
    /// Token type
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Lifetime as a duration string, e.g. `720h`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

/// Client for the backoffice API.
#[derive(Debug, Clone)]
pub struct BackofficeClient {
    http: Transport,
}

fn account_path(account_id: Uuid) -> String {
    format!("/api/accounts/{account_id}")
}

impl BackofficeClient {
    pub(crate) fn new(http: Transport) -> Self {
        Self { http }
    }

    pub(crate) fn set_admin_token(&self, secret: &str) {
        self.http.set_admin_token(secret);
    }

    /// Health of the backoffice API.
    pub async fn health(&self, ctx: &CallContext) -> Result<()> {
        self.http
            .dispatch(ctx, Method::GET, "/api/health", NO_BODY)
            .await
    }

    /// Dashboard statistics.
    pub async fn stats(&self, ctx: &CallContext) -> Result<Stats> {
        Ok(self.http.fetch(ctx, "/api/stats").await?.unwrap_or_default())
    }

    /// All accounts.
    pub async fn list_accounts(&self, ctx: &CallContext) -> Result<Vec<Account>> {
        Ok(self.http.fetch(ctx, "/api/accounts").await?.unwrap_or_default())
    }

    /// One account.
    pub async fn account(&self, ctx: &CallContext, account_id: Uuid) -> Result<Account> {
        Ok(self
            .http
            .fetch(ctx, &account_path(account_id))
            .await?
            .unwrap_or_default())
    }

    /// Create an account.
    pub async fn create_account(&self, ctx: &CallContext, request: &CreateAccountRequest) -> Result<Account> {
        Ok(self
            .http
            .submit(ctx, "/api/accounts", Some(request))
            .await?
            .unwrap_or_default())
    }

    /// Update an account.
    pub async fn update_account(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
        request: &UpdateAccountRequest,
    ) -> Result<Account> {
        Ok(self
            .http
            .replace(ctx, &account_path(account_id), Some(request))
            .await?
            .unwrap_or_default())
    }

    /// Delete an account.
    pub async fn delete_account(&self, ctx: &CallContext, account_id: Uuid) -> Result<()> {
        self.http.remove(ctx, &account_path(account_id)).await
    }

    /// Lock an account, optionally recording why.
    pub async fn lock_account(&self, ctx: &CallContext, account_id: Uuid, reason: Option<&str>) -> Result<()> {
        let mut body = BTreeMap::new();
        if let Some(reason) = reason.filter(|r| !r.is_empty()) {
            body.insert("reason", reason);
        }
        let path = format!("{}/lock", account_path(account_id));
        self.http.dispatch(ctx, Method::PUT, &path, Some(&body)).await
    }

    /// Unlock an account.
    pub async fn unlock_account(&self, ctx: &CallContext, account_id: Uuid) -> Result<()> {
        let path = format!("{}/unlock", account_path(account_id));
        self.http.dispatch(ctx, Method::PUT, &path, NO_BODY).await
    }

    /// Tokens of an account.
    pub async fn account_tokens(&self, ctx: &CallContext, account_id: Uuid) -> Result<Vec<Token>> {
        let path = format!("{}/tokens", account_path(account_id));
        Ok(self.http.fetch(ctx, &path).await?.unwrap_or_default())
    }

    /// Issue a token for an account.
    pub async fn create_account_token(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
        request: &CreateAccountTokenRequest,
    ) -> Result<Token> {
        let path = format!("{}/tokens", account_path(account_id));
        Ok(self
            .http
            .submit(ctx, &path, Some(request))
            .await?
            .unwrap_or_default())
    }

    /// Revoke any token.
    pub async fn delete_token(&self, ctx: &CallContext, token: &str) -> Result<()> {
        let path = segment_path("/api/tokens", &[token])?;
        self.http.remove(ctx, &path).await
    }

    /// Layouts of an account.
    pub async fn account_layouts(&self, ctx: &CallContext, account_id: Uuid) -> Result<Vec<LayoutRecord>> {
        let path = format!("{}/layouts", account_path(account_id));
        Ok(self.http.fetch(ctx, &path).await?.unwrap_or_default())
    }

    /// Delete one layout of an account.
    pub async fn delete_account_layout(&self, ctx: &CallContext, account_id: Uuid, layout_id: Uuid) -> Result<()> {
        let path = format!("{}/layouts/{layout_id}", account_path(account_id));
        self.http.remove(ctx, &path).await
    }

    /// Subscription counts and revenue.
    pub async fn subscription_stats(&self, ctx: &CallContext) -> Result<SubscriptionStats> {
        Ok(self
            .http
            .fetch(ctx, "/api/subscriptions/stats")
            .await?
            .unwrap_or_default())
    }

    /// All subscriptions.
    pub async fn list_subscriptions(&self, ctx: &CallContext) -> Result<Vec<Subscription>> {
        Ok(self.http.fetch(ctx, "/api/subscriptions").await?.unwrap_or_default())
    }

    /// Available plans.
    pub async fn list_plans(&self, ctx: &CallContext) -> Result<Vec<Plan>> {
        Ok(self
            .http
            .fetch(ctx, "/api/subscriptions/plans")
            .await?
            .unwrap_or_default())
    }

    /// Subscription of an account.
    pub async fn account_subscription(&self, ctx: &CallContext, account_id: Uuid) -> Result<Subscription> {
        let path = format!("{}/subscription", account_path(account_id));
        Ok(self.http.fetch(ctx, &path).await?.unwrap_or_default())
    }

    /// Move an account to another plan.
    pub async fn update_account_subscription(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
        plan_id: &str,
    ) -> Result<Subscription> {
        let path = format!("{}/subscription", account_path(account_id));
        let body = BTreeMap::from([("plan_id", plan_id)]);
        Ok(self
            .http
            .replace(ctx, &path, Some(&body))
            .await?
            .unwrap_or_default())
    }

    /// Asset type switches.
    pub async fn list_asset_types(&self, ctx: &CallContext) -> Result<Vec<AssetTypeConfig>> {
        Ok(self.http.fetch(ctx, "/api/asset-types").await?.unwrap_or_default())
    }

    /// Enable or disable an asset type.
    pub async fn update_asset_type(&self, ctx: &CallContext, type_name: &str, enabled: bool) -> Result<AssetTypeConfig> {
        let path = segment_path("/api/asset-types", &[type_name])?;
        let body = BTreeMap::from([("enabled", enabled)]);
        Ok(self
            .http
            .replace(ctx, &path, Some(&body))
            .await?
            .unwrap_or_default())
    }
}
