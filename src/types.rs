//! Request and response models shared by the service clients.
//!
//! Payloads the transport only forwards (layout grids, building descriptions)
//! stay as [`serde_json::Value`]; the types here cover what the service
//! clients build or return.
#![allow(missing_docs)]

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Building status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Online,
    Offline,
    Warning,
    Critical,
}

/// Activity level of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Slow,
    Normal,
    Fast,
}

/// Traffic speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    Normal,
    Fast,
}

impl Speed {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Speed::Slow => "slow",
            Speed::Normal => "normal",
            Speed::Fast => "fast",
        }
    }
}

/// Camera mode of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    Orbit,
    Fps,
    Flyover,
}

impl CameraMode {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraMode::Orbit => "orbit",
            CameraMode::Fps => "fps",
            CameraMode::Flyover => "flyover",
        }
    }
}

/// Kind of authentication token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Admin,
    User,
    Viewer,
    Sensor,
}

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lock_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// An authentication token and its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "app_token", default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub validation_link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roles: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<String>,
}

/// One band of a monitor tube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub value: i64,
}

/// A sensor reading for one building.
///
/// Building-specific fields are optional; `extra` carries anything else and
/// is merged into the payload without overriding the typed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorData {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,

    /// Bank: none, low, medium, full
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tower_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tower_b_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dancer_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_rotation_enabled: Option<bool>,
    /// DataCenter: 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<i64>,
    /// DataCenter: 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_usage: Option<i64>,
    /// DataCenter: 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_traffic: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_connections: Option<i64>,
    /// DataCenter: Celsius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<Band>>,

    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl SensorData {
    /// A reading for building `id` with nothing set.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the activity.
    #[must_use]
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Add a custom field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// JSON payload with `extra` merged in. Typed fields win on key clashes.
    pub fn to_payload(&self) -> Result<Value> {
        let mut payload = serde_json::to_value(self)
            .map_err(|e| Error::validation("failed to marshal sensor data", e))?;
        if let Value::Object(fields) = &mut payload {
            for (key, value) in &self.extra {
                fields.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        Ok(payload)
    }
}

/// Traffic control state of a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficState {
    pub layout_id: String,
    pub density: i64,
    pub speed: String,
    pub enabled: bool,
    #[serde(default)]
    pub labels_visible: bool,
}

/// Backoffice dashboard statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_accounts: i64,
    pub active_accounts: i64,
    pub locked_accounts: i64,
    pub total_tokens: i64,
    pub total_layouts: i64,
}

/// Grid dimensions of a layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i64,
    pub height: i64,
}

/// A city layout as sent to the UI service.
///
/// Buildings and roads are forwarded as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub grid: Grid,
    #[serde(default)]
    pub buildings: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roads: Option<Value>,
}

/// A layout as stored by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub layout_id: Option<Uuid>,
    #[serde(default)]
    pub received_at: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub archive_reason: String,
}

/// Layout usage of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutQuota {
    #[serde(default)]
    pub used: i64,
    #[serde(default)]
    pub max: i64,
    #[serde(default)]
    pub archived: i64,
}

/// Per-layout asset limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuota {
    #[serde(default)]
    pub max: i64,
}

/// Plan and usage of the authenticated account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaInfo {
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub layouts: LayoutQuota,
    #[serde(default)]
    pub assets_per_layout: AssetQuota,
}

impl QuotaInfo {
    /// Whether another layout fits in the plan.
    pub fn can_create_layout(&self) -> bool {
        self.layouts.used < self.layouts.max
    }
}

/// A 3D scene connected to the UI service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedScene {
    pub scene_id: String,
    #[serde(default)]
    pub layout_id: Option<Uuid>,
    #[serde(default)]
    pub connected_at: Option<String>,
    #[serde(default)]
    pub last_heartbeat: Option<String>,
}

/// Subscription of an account to a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stripe_subscription_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stripe_customer_id: String,
    #[serde(default)]
    pub current_period_start: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<String>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A subscription plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub max_assets: i64,
    #[serde(default)]
    pub max_layouts: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stripe_price_id: String,
}

/// Subscription statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStats {
    #[serde(default)]
    pub total_subscriptions: i64,
    #[serde(default)]
    pub by_plan: BTreeMap<String, i64>,
    #[serde(default)]
    pub by_status: BTreeMap<String, i64>,
    /// Monthly recurring revenue
    #[serde(default)]
    pub mrr: f64,
}

/// Whether an asset type may be placed in layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTypeConfig {
    pub type_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sensor_payload_uses_wire_names() {
        let id = Uuid::nil();
        let mut data = SensorData::new(id).with_status(Status::Online);
        data.tower_b_text = Some("HELLO".to_string());
        data.face_rotation_enabled = Some(true);

        let payload = data.to_payload().unwrap();
        assert_eq!(
            payload,
            json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "status": "online",
                "towerBText": "HELLO",
                "faceRotationEnabled": true
            })
        );
    }

    #[test]
    fn test_extra_does_not_override_typed_fields() {
        let data = SensorData::new(Uuid::nil())
            .with_activity(Activity::Fast)
            .with_extra("activity", "slow")
            .with_extra("custom", 42);

        let payload = data.to_payload().unwrap();
        assert_eq!(payload["activity"], "fast");
        assert_eq!(payload["custom"], 42);
    }

    #[test]
    fn test_token_deserializes_app_token() {
        let token: Token = serde_json::from_value(json!({
            "app_token": "abc",
            "type": "user",
            "roles": {"layout": "rw"}
        }))
        .unwrap();
        assert_eq!(token.token, "abc");
        assert_eq!(token.token_type, "user");
        assert_eq!(token.roles.get("layout").map(String::as_str), Some("rw"));
    }

    #[test]
    fn test_quota_info_tolerates_missing_sections() {
        let quota: QuotaInfo = serde_json::from_value(json!({
            "plan": "free",
            "layouts": {"used": 1, "max": 1}
        }))
        .unwrap();
        assert_eq!(quota.plan, "free");
        assert_eq!(quota.layouts.archived, 0);
        assert_eq!(quota.assets_per_layout.max, 0);
        assert!(!quota.can_create_layout());
    }

    #[test]
    fn test_layout_wire_shape() {
        let layout = Layout {
            name: "downtown".to_string(),
            grid: Grid { width: 10, height: 8 },
            buildings: vec![json!({"type": "bank"})],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&layout).unwrap(),
            json!({
                "name": "downtown",
                "grid": {"width": 10, "height": 8},
                "buildings": [{"type": "bank"}]
            })
        );
    }
}
