//! Real-time event types broadcast over WebSocket connections.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use sp_protocol::{CommandStatus, DeviceEvent};

/// Server-sent events pushed to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    /// A command was accepted and dispatched to the device.
    CommandCreated {
        command_id: Uuid,
        device_id: String,
        user_id: String,
        details: serde_json::Value,
        created_at: DateTime<Utc>,
    },

    /// A device acknowledged a command.
    CommandStatusChanged {
        command_id: Uuid,
        device_id: String,
        status: CommandStatus,
        updated_at: DateTime<Utc>,
    },

    /// A device published an event (fault, diagnostic, ...).
    DeviceEventReceived { event: DeviceEvent },
}

impl WsEvent {
    /// Device the event concerns.
    pub fn device_id(&self) -> &str {
        match self {
            WsEvent::CommandCreated { device_id, .. }
            | WsEvent::CommandStatusChanged { device_id, .. } => device_id,
            WsEvent::DeviceEventReceived { event } => &event.device_id,
        }
    }
}
