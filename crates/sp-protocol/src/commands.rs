use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable record of a command issued against a device.
///
/// `details` is written once at creation and never mutated afterwards;
/// only `status` and `updated_at` change over the command's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Unique command ID (UUIDv4).
    pub command_id: Uuid,
    /// Target device identifier.
    pub device_id: String,
    /// Owner of the device registration that issued the command.
    pub user_id: String,
    /// Current lifecycle status.
    pub status: CommandStatus,
    /// Strategy-specific payload, opaque to the store.
    pub details: serde_json::Value,
    /// When the command was created.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl Command {
    /// Build a fresh pending command. Every call yields a new ID.
    pub fn new(
        device_id: impl Into<String>,
        user_id: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            command_id: Uuid::new_v4(),
            device_id: device_id.into(),
            user_id: user_id.into(),
            status: CommandStatus::Pending,
            details,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lifecycle status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    Success,
    Failed,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "pending",
            CommandStatus::Success => "success",
            CommandStatus::Failed => "failed",
        }
    }

    /// Whether the device has reported an outcome.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommandStatus::Pending)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for CommandStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommandStatus::Pending),
            "success" => Ok(CommandStatus::Success),
            "failed" => Ok(CommandStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Push notification sent to the device's command channel after the
/// twin has been patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandNotification {
    pub command_id: Uuid,
    pub device_id: String,
    pub status: CommandStatus,
    /// The desired-state patch that was applied to the twin.
    pub details: serde_json::Value,
}

/// Acknowledgment published by the device once a reconciled change has
/// been reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandAck {
    pub command_id: Uuid,
    pub device_id: String,
    /// Free-form outcome description (e.g. "success").
    pub reason: String,
    pub status: CommandStatus,
}

impl CommandAck {
    pub fn success(command_id: Uuid, device_id: impl Into<String>) -> Self {
        Self {
            command_id,
            device_id: device_id.into(),
            reason: "success".into(),
            status: CommandStatus::Success,
        }
    }
}

/// Messages observed on a device command channel. The cloud's own
/// notifications and the device's acknowledgments share the topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandChannelMessage {
    Ack(CommandAck),
    Notification(CommandNotification),
}

impl CommandChannelMessage {
    pub fn command_id(&self) -> Uuid {
        match self {
            CommandChannelMessage::Ack(ack) => ack.command_id,
            CommandChannelMessage::Notification(n) => n.command_id,
        }
    }
}

/// Authenticated caller identity, produced by the surrounding
/// authorization layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub user_id: String,
}

impl Ticket {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
