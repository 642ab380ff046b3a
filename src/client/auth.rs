//! Authentication and account endpoints.

use crate::error::Result;
use crate::transport::{segment_path, CallContext, Transport};
use crate::types::{Token, TokenType};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /auth/signup` and `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialsRequest {
    /// Account email
    pub email: String,
    /// Token type to issue
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Application the token is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

impl CredentialsRequest {
    /// Request for `email` with a token type and nothing else.
    pub fn new(email: impl Into<String>, token_type: TokenType) -> Self {
        Self {
            email: email.into(),
            token_type,
            name: None,
            app_id: None,
        }
    }
}

/// Body of `POST /account/token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTokenRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[allow(missing_docs)]
    pub token_type: TokenType,
}

#[derive(Debug, Default, Deserialize)]
struct AppTokenResponse {
    #[serde(default)]
    app_token: String,
}

/// Client for the auth service.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: Transport,
}

impl AuthClient {
    pub(crate) fn new(http: Transport) -> Self {
        Self { http }
    }

    /// Create an account and return its first token.
    pub async fn signup(&self, ctx: &CallContext, request: &CredentialsRequest) -> Result<Token> {
        self.issue(ctx, "/auth/signup", request).await
    }

    /// Log into an existing account.
    pub async fn login(&self, ctx: &CallContext, request: &CredentialsRequest) -> Result<Token> {
        self.issue(ctx, "/auth/login", request).await
    }

    async fn issue(&self, ctx: &CallContext, path: &str, request: &CredentialsRequest) -> Result<Token> {
        let response: Option<AppTokenResponse> = self.http.submit(ctx, path, Some(request)).await?;
        Ok(Token {
            token: response.unwrap_or_default().app_token,
            ..Default::default()
        })
    }

    /// Log out, revoking the token of `app_id` when given.
    pub async fn logout(&self, ctx: &CallContext, app_id: Option<&str>) -> Result<()> {
        let mut body = BTreeMap::new();
        if let Some(app_id) = app_id.filter(|id| !id.is_empty()) {
            body.insert("app_id", app_id);
        }
        self.http
            .dispatch(ctx, Method::POST, "/auth/logout", Some(&body))
            .await
    }

    /// Available roles per token type.
    pub async fn roles(&self, ctx: &CallContext) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
        Ok(self.http.fetch(ctx, "/auth/roles").await?.unwrap_or_default())
    }

    /// Validate a token and return its details.
    pub async fn check_token(&self, ctx: &CallContext, token: &str) -> Result<Token> {
        let path = segment_path("/auth/check", &[token])?;
        Ok(self.http.fetch(ctx, &path).await?.unwrap_or_default())
    }

    /// Tokens of the authenticated account.
    pub async fn list_tokens(&self, ctx: &CallContext) -> Result<Vec<Token>> {
        Ok(self.http.fetch(ctx, "/account/token").await?.unwrap_or_default())
    }

    /// Issue a new token for the authenticated account.
    pub async fn create_token(&self, ctx: &CallContext, request: &CreateTokenRequest) -> Result<Token> {
        Ok(self
            .http
            .submit(ctx, "/account/token", Some(request))
            .await?
            .unwrap_or_default())
    }

    /// Revoke a token.
    pub async fn revoke_token(&self, ctx: &CallContext, token: &str) -> Result<()> {
        let path = segment_path("/account/token", &[token])?;
        self.http.remove(ctx, &path).await
    }

    /// Delete the authenticated account.
    pub async fn delete_account(&self, ctx: &CallContext) -> Result<()> {
        self.http.remove(ctx, "/account/delete").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_request_wire_shape() {
        let mut request = CredentialsRequest::new("ada@example.com", TokenType::Sensor);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"email": "ada@example.com", "type": "sensor"})
        );

        request.app_id = Some("dashboard".to_string());
        assert_eq!(
            serde_json::to_value(&request).unwrap()["app_id"],
            "dashboard"
        );
    }
}
