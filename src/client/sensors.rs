//! Sensor ingestion endpoints.
//!
//! Readings are fire-and-forget: the service answers with an acknowledgement
//! the client does not decode.

use crate::error::Result;
use crate::transport::{CallContext, Transport, NO_BODY};
use crate::types::{CameraMode, SensorData, Speed, TrafficState};
use reqwest::Method;
use serde_json::{json, Map, Value};

/// Client for the sensor endpoint.
#[derive(Debug, Clone)]
pub struct SensorsClient {
    http: Transport,
}

impl SensorsClient {
    pub(crate) fn new(http: Transport) -> Self {
        Self { http }
    }

    /// Send one reading.
    pub async fn send(&self, ctx: &CallContext, data: &SensorData) -> Result<()> {
        let payload = data.to_payload()?;
        self.http
            .dispatch(ctx, Method::POST, "/sensors", Some(&payload))
            .await
    }

    /// Send an untyped reading.
    pub async fn send_raw(&self, ctx: &CallContext, data: &Map<String, Value>) -> Result<()> {
        self.http
            .dispatch(ctx, Method::POST, "/sensors", Some(data))
            .await
    }

    /// Send readings one after another, stopping at the first failure.
    pub async fn send_multiple(&self, ctx: &CallContext, data: &[SensorData]) -> Result<()> {
        for reading in data {
            self.send(ctx, reading).await?;
        }
        Ok(())
    }

    /// Health of the sensor endpoint.
    pub async fn health(&self, ctx: &CallContext) -> Result<()> {
        self.http
            .dispatch(ctx, Method::GET, "/sensors/_health", NO_BODY)
            .await
    }

    /// Set the camera mode of a layout. `flyover_speed` is only sent when positive.
    pub async fn set_camera_mode(
        &self,
        ctx: &CallContext,
        layout_id: &str,
        mode: CameraMode,
        flyover_speed: Option<f64>,
    ) -> Result<()> {
        let mut body = json!({
            "layout_id": layout_id,
            "mode": mode.as_str(),
        });
        if let Some(speed) = flyover_speed.filter(|s| *s > 0.0) {
            body["flyover_speed"] = json!(speed);
        }
        self.http
            .dispatch(ctx, Method::POST, "/camera", Some(&body))
            .await
    }

    /// Camera state of every layout.
    pub async fn camera_states(&self, ctx: &CallContext) -> Result<Vec<Map<String, Value>>> {
        Ok(self.http.fetch(ctx, "/camera").await?.unwrap_or_default())
    }

    /// Set the traffic state of a layout.
    pub async fn set_traffic_state(
        &self,
        ctx: &CallContext,
        layout_id: &str,
        density: i64,
        speed: Speed,
        enabled: bool,
    ) -> Result<()> {
        let body = json!({
            "layout_id": layout_id,
            "density": density,
            "speed": speed.as_str(),
            "enabled": enabled,
        });
        self.http
            .dispatch(ctx, Method::POST, "/traffic", Some(&body))
            .await
    }

    /// Traffic state of every layout.
    pub async fn traffic_states(&self, ctx: &CallContext) -> Result<Vec<TrafficState>> {
        Ok(self.http.fetch(ctx, "/traffic").await?.unwrap_or_default())
    }
}
