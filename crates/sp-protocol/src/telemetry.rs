use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Periodic telemetry snapshot: the device's full local state flattened
/// into the top level, plus envelope fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryMessage {
    pub device_id: String,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// When the snapshot was handed to the transport.
    pub sent_at: DateTime<Utc>,
    /// Snapshot time as milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Device state at snapshot time.
    #[serde(flatten)]
    pub state: serde_json::Map<String, serde_json::Value>,
}

impl TelemetryMessage {
    /// Snapshot `state`. Non-object states produce an empty snapshot.
    pub fn snapshot(device_id: impl Into<String>, state: &serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            device_id: device_id.into(),
            created_at: now,
            sent_at: now,
            timestamp: now.timestamp_millis(),
            state: state.as_object().cloned().unwrap_or_default(),
        }
    }
}
