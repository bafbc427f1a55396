//! AWS IoT Device Shadow MQTT operations.
//!
//! Typed helpers for publishing shadow updates and subscribing to shadow
//! delta notifications via any `Channel`.

use rumqttc::QoS;
use serde_json::Value;

use crate::channel::{Channel, publish_json};
use crate::error::MqttResult;
use sp_protocol::{ShadowUpdate, topics};

/// Shadow operations for one thing, backed by a `Channel` implementation.
pub struct ShadowClient<'a, C: Channel + ?Sized> {
    channel: &'a C,
    thing_name: String,
}

impl<'a, C: Channel + ?Sized> ShadowClient<'a, C> {
    pub fn new(channel: &'a C, thing_name: impl Into<String>) -> Self {
        Self {
            channel,
            thing_name: thing_name.into(),
        }
    }

    pub fn thing_name(&self) -> &str {
        &self.thing_name
    }

    /// Publish a shadow update document.
    pub async fn publish_update(&self, update: &ShadowUpdate) -> MqttResult<()> {
        let topic = topics::shadow_update(&self.thing_name);
        publish_json(self.channel, &topic, update).await
    }

    /// Report device state, optionally echoing a desired-state patch.
    pub async fn report_state(&self, reported: Value, desired: Option<Value>) -> MqttResult<()> {
        let mut update = ShadowUpdate::reported(reported);
        update.state.desired = desired;
        self.publish_update(&update).await
    }

    /// Merge a patch into the desired state.
    pub async fn update_desired(&self, patch: Value) -> MqttResult<()> {
        self.publish_update(&ShadowUpdate::desired(patch)).await
    }

    /// Subscribe to shadow delta notifications for this thing.
    pub async fn subscribe_delta(&self) -> MqttResult<()> {
        let topic = topics::shadow_delta(&self.thing_name);
        self.channel.subscribe(&topic, QoS::AtLeastOnce).await
    }
}
