use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binding between a user and a device, including the hardware model that
/// decides how commands for the device are encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    /// Owner of the device.
    pub user_id: String,
    /// Device identifier (IoT thing name).
    pub device_id: String,
    /// Hardware model number (e.g. "sim-controller").
    pub model_number: String,
}

impl DeviceRegistration {
    pub fn new(
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        model_number: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
            model_number: model_number.into(),
        }
    }
}

/// Severity of a device event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Info,
    Warning,
    Error,
    Diagnostic,
}

/// Structured payload of a device event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    /// Stable identifier of the event kind (e.g. "fan-fault").
    pub event_id: String,
    /// Sensor or sub-entity the event refers to, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<String>,
    /// Human-readable sensor name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor: Option<String>,
    /// Observed value.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Event published by a device on its event topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEvent {
    pub device_id: String,
    /// Unique message ID (UUIDv7 for time-sortability).
    pub message_id: Uuid,
    /// Human-readable summary.
    pub message: String,
    pub details: EventDetails,
    /// When the event occurred on the device.
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// When the event was handed to the transport.
    pub sent_at: DateTime<Utc>,
}

impl DeviceEvent {
    pub fn new(
        device_id: impl Into<String>,
        event_type: EventType,
        message: impl Into<String>,
        details: EventDetails,
    ) -> Self {
        let now = Utc::now();
        Self {
            device_id: device_id.into(),
            message_id: Uuid::now_v7(),
            message: message.into(),
            details,
            timestamp: now,
            event_type,
            sent_at: now,
        }
    }
}
