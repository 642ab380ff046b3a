//! Layout management on the UI service.
//!
//! Creating a layout, or adding assets to one, is where plan limits bite:
//! the service answers `402` with `LAYOUT_QUOTA_EXCEEDED` or
//! `ASSET_QUOTA_EXCEEDED`, surfaced as [`crate::QuotaError`]. [`UiClient::quota`]
//! reports the same plan and usage up front.

use crate::error::Result;
use crate::transport::{segment_path, CallContext, Transport, NO_BODY};
use crate::types::{ConnectedScene, Layout, LayoutRecord, QuotaInfo};
use reqwest::Method;
use serde::Serialize;
use uuid::Uuid;

/// Body of `POST /ui/scene/{id}/state`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneStateRequest {
    /// Layout shown by the scene
    pub layout_id: String,
    /// Toggle flyover
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flyover_enabled: Option<bool>,
    /// Flyover speed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flyover_speed: Option<i64>,
    /// Camera path to follow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_path_id: Option<String>,
}

/// Client for the UI service.
#[derive(Debug, Clone)]
pub struct UiClient {
    http: Transport,
}

impl UiClient {
    pub(crate) fn new(http: Transport) -> Self {
        Self { http }
    }

    /// Underlying transport, for endpoints without a typed wrapper.
    pub fn transport(&self) -> &Transport {
        &self.http
    }

    /// Create or replace a layout.
    pub async fn create_layout(&self, ctx: &CallContext, layout: &Layout) -> Result<LayoutRecord> {
        Ok(self
            .http
            .submit(ctx, "/ui/layout", Some(layout))
            .await?
            .unwrap_or_default())
    }

    /// Same upsert as [`UiClient::create_layout`].
    pub async fn update_layout(&self, ctx: &CallContext, layout: &Layout) -> Result<LayoutRecord> {
        self.create_layout(ctx, layout).await
    }

    /// Delete a layout.
    pub async fn delete_layout(&self, ctx: &CallContext, layout_id: Uuid) -> Result<()> {
        self.http.remove(ctx, &format!("/ui/layout/{layout_id}")).await
    }

    /// Plan and usage of the account.
    pub async fn quota(&self, ctx: &CallContext) -> Result<QuotaInfo> {
        Ok(self.http.fetch(ctx, "/ui/quota").await?.unwrap_or_default())
    }

    /// Layouts archived after a plan downgrade.
    pub async fn archived_layouts(&self, ctx: &CallContext) -> Result<Vec<LayoutRecord>> {
        Ok(self
            .http
            .fetch(ctx, "/ui/layout/archived")
            .await?
            .unwrap_or_default())
    }

    /// Bring an archived layout back.
    pub async fn restore_layout(&self, ctx: &CallContext, layout_id: Uuid) -> Result<()> {
        let path = format!("/ui/layout/{layout_id}/restore");
        self.http.dispatch(ctx, Method::POST, &path, NO_BODY).await
    }

    /// Scenes currently connected.
    pub async fn scenes(&self, ctx: &CallContext) -> Result<Vec<ConnectedScene>> {
        Ok(self.http.fetch(ctx, "/ui/scenes").await?.unwrap_or_default())
    }

    /// Change what a connected scene shows.
    pub async fn update_scene_state(
        &self,
        ctx: &CallContext,
        scene_id: &str,
        request: &SceneStateRequest,
    ) -> Result<()> {
        let path = segment_path("/ui/scene", &[scene_id, "state"])?;
        self.http
            .dispatch(ctx, Method::POST, &path, Some(request))
            .await
    }
}
