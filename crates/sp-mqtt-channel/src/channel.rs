//! MQTT channel: async client for AWS IoT Core communication.
//!
//! Wraps `rumqttc::AsyncClient` with typed publish helpers for
//! telemetry, events, command acknowledgments and notifications.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use serde::Serialize;

use crate::config::MqttConfig;
use crate::error::{MqttError, MqttResult};
use crate::tls;
use sp_protocol::{CommandAck, CommandNotification, DeviceEvent, TelemetryMessage, topics};

// ── Channel trait ─────────────────────────────────────────────

/// Abstraction for MQTT message publishing and subscribing.
///
/// Enables mocking in tests without a real MQTT broker.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Publish a raw payload to a topic.
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> MqttResult<()>;

    /// Subscribe to a topic filter.
    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()>;
}

/// Serialize `payload` as JSON and publish it at-least-once.
pub async fn publish_json<C, T>(channel: &C, topic: &str, payload: &T) -> MqttResult<()>
where
    C: Channel + ?Sized,
    T: Serialize + Sync,
{
    let bytes = serde_json::to_vec(payload)?;
    channel.publish(topic, &bytes, QoS::AtLeastOnce).await
}

// ── MqttChannel ───────────────────────────────────────────────

/// MQTT channel connected to AWS IoT Core.
///
/// Owns the `AsyncClient` for publishing/subscribing. The `EventLoop`
/// is returned separately from `new()`; the caller must drive it via
/// `eventloop.poll()`.
pub struct MqttChannel {
    client: AsyncClient,
    namespace: String,
    device_id: String,
}

impl MqttChannel {
    /// Create a new MQTT channel. Uses mTLS unless `config.use_tls` is off.
    pub fn new(
        config: &MqttConfig,
        namespace: impl Into<String>,
        device_id: impl Into<String>,
    ) -> MqttResult<(Self, EventLoop)> {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(config.keepalive_secs.into()));
        options.set_transport(tls::transport_for(config)?);

        let (client, eventloop) = AsyncClient::new(options, 64);

        Ok((
            Self {
                client,
                namespace: namespace.into(),
                device_id: device_id.into(),
            },
            eventloop,
        ))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    // ── Typed publish helpers ─────────────────────────────────

    /// Publish a telemetry snapshot.
    pub async fn publish_telemetry(&self, message: &TelemetryMessage) -> MqttResult<()> {
        let topic = topics::telemetry(&self.namespace, &self.device_id);
        publish_json(self, &topic, message).await
    }

    /// Publish a device event.
    pub async fn publish_event(&self, event: &DeviceEvent) -> MqttResult<()> {
        let topic = topics::event(&self.namespace, &self.device_id);
        publish_json(self, &topic, event).await
    }

    /// Publish a command acknowledgment on this device's command channel.
    pub async fn publish_ack(&self, ack: &CommandAck) -> MqttResult<()> {
        let topic = topics::commands(&self.namespace, &self.device_id);
        publish_json(self, &topic, ack).await
    }

    /// Publish a command notification to `notification.device_id`.
    pub async fn publish_notification(&self, notification: &CommandNotification) -> MqttResult<()> {
        let topic = topics::commands(&self.namespace, &notification.device_id);
        publish_json(self, &topic, notification).await
    }

    // ── Subscription helpers ──────────────────────────────────

    /// Subscribe to this device's command channel.
    pub async fn subscribe_commands(&self) -> MqttResult<()> {
        let topic = topics::commands(&self.namespace, &self.device_id);
        self.subscribe(&topic, QoS::AtLeastOnce).await
    }

    /// Subscribe to every device's command channel (cloud bridge).
    pub async fn subscribe_all_commands(&self) -> MqttResult<()> {
        let filter = topics::all_commands(&self.namespace);
        self.subscribe(&filter, QoS::AtLeastOnce).await
    }

    /// Subscribe to every device's event channel (cloud bridge).
    pub async fn subscribe_all_events(&self) -> MqttResult<()> {
        let filter = topics::all_events(&self.namespace);
        self.subscribe(&filter, QoS::AtLeastOnce).await
    }

    /// Disconnect cleanly from the broker.
    pub async fn disconnect(&self) -> MqttResult<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| MqttError::Connection(e.to_string()))
    }
}

#[async_trait]
impl Channel for MqttChannel {
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> MqttResult<()> {
        self.client
            .publish(topic, qos, false, payload)
            .await
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()> {
        self.client
            .subscribe(filter, qos)
            .await
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }
}
