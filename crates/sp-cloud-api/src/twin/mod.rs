//! Device twin and command notification transports.
//!
//! `TwinService` merges a patch into a device's desired state; `Notifier`
//! tells the device a command was issued. Production backends publish
//! through AWS IoT (data-plane API or MQTT); `MemoryTwin` keeps shadows
//! in-process for development and tests.

pub mod channel;
pub mod iot_data;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use sp_protocol::CommandNotification;

pub use channel::ChannelTwin;
pub use iot_data::IotDataTwin;
pub use memory::MemoryTwin;

#[derive(Debug, Error)]
pub enum TwinError {
    #[error("shadow update for '{thing}' failed: {reason}")]
    Update { thing: String, reason: String },

    #[error("publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TwinResult<T> = Result<T, TwinError>;

#[async_trait]
pub trait TwinService: Send + Sync {
    /// Merge `patch` into the desired state of `device_id`'s twin.
    async fn patch_desired(&self, device_id: &str, patch: &Value) -> TwinResult<()>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish `notification` on the device's command topic.
    async fn notify(&self, notification: &CommandNotification) -> TwinResult<()>;
}
