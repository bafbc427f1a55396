//! Incoming message classification for the MQTT event loop.
//!
//! Parses raw MQTT publishes into typed `IncomingMessage` variants so the
//! device simulator and cloud bridge can dispatch them without topic
//! string matching.

use rumqttc::Publish;

use sp_protocol::topics::{self, TopicKind};
use sp_protocol::{CommandChannelMessage, DeviceEvent, ShadowDelta, ShadowUpdate};

/// A classified incoming MQTT message.
#[derive(Debug)]
pub enum IncomingMessage {
    /// Notification or acknowledgment on a device command channel.
    Command {
        device_id: String,
        message: CommandChannelMessage,
    },
    /// Desired state diverged from reported.
    ShadowDelta { device_id: String, delta: ShadowDelta },
    /// Shadow update document published by a device or the cloud.
    ShadowUpdate {
        device_id: String,
        update: ShadowUpdate,
    },
    /// Event emitted by a device.
    Event(DeviceEvent),
    /// Unrecognized topic or payload.
    Unknown { topic: String, payload: Vec<u8> },
}

/// Classify a raw MQTT publish into a typed message.
pub fn classify(publish: &Publish) -> IncomingMessage {
    let topic = publish.topic.as_str();
    let payload: &[u8] = &publish.payload;
    let unknown = || IncomingMessage::Unknown {
        topic: topic.to_string(),
        payload: payload.to_vec(),
    };

    let Some(parsed) = topics::parse_topic(topic) else {
        return unknown();
    };
    let device_id = parsed.device_id;

    match parsed.kind {
        TopicKind::Commands => match serde_json::from_slice(payload) {
            Ok(message) => IncomingMessage::Command { device_id, message },
            Err(_) => unknown(),
        },
        TopicKind::ShadowDelta => match serde_json::from_slice(payload) {
            Ok(delta) => IncomingMessage::ShadowDelta { device_id, delta },
            Err(_) => unknown(),
        },
        TopicKind::ShadowUpdate => match serde_json::from_slice(payload) {
            Ok(update) => IncomingMessage::ShadowUpdate { device_id, update },
            Err(_) => unknown(),
        },
        TopicKind::Event => match serde_json::from_slice(payload) {
            Ok(event) => IncomingMessage::Event(event),
            Err(_) => unknown(),
        },
        // Telemetry is outbound only.
        TopicKind::Telemetry => unknown(),
    }
}
