//! MQTT event loop driver and incoming message dispatcher.
//!
//! Drives the rumqttc event loop, classifies incoming publishes and routes
//! shadow deltas and command notifications to the device.

use std::time::Duration;

use rumqttc::{Event, EventLoop, Packet};
use serde_json::json;

use sp_mqtt_channel::{Channel, IncomingMessage, classify, publish_json};
use sp_protocol::{DeviceEvent, EventDetails, EventType, topics};

use crate::reconciler::SharedDevice;
use crate::shadow_sync;

/// Drive the MQTT event loop and dispatch incoming messages.
///
/// Runs forever. Connection errors are logged and retried after a pause.
pub async fn run<C: Channel + ?Sized>(mut eventloop: EventLoop, channel: &C, device: &SharedDevice) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handle_message(classify(&publish), channel, device).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT event loop error, reconnecting in 5s");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

pub async fn handle_message<C: Channel + ?Sized>(
    msg: IncomingMessage,
    channel: &C,
    device: &SharedDevice,
) {
    match msg {
        IncomingMessage::ShadowDelta { device_id, delta } => {
            if !is_ours(device, &device_id).await {
                return;
            }
            tracing::info!(version = delta.version, "shadow delta received");

            let applied = device.lock().await.apply_delta(&delta.state);
            match applied {
                Ok(true) => {
                    if let Err(e) = shadow_sync::report_state(channel, device).await {
                        tracing::warn!(error = %e, "failed to report state after delta");
                    }
                }
                Ok(false) => tracing::debug!("delta carried no leaf changes"),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to apply shadow delta");
                    publish_diagnostic(channel, device, &e.to_string()).await;
                }
            }
        }
        IncomingMessage::Command { device_id, message } => {
            if !is_ours(device, &device_id).await {
                return;
            }
            let (topic, ack) = {
                let mut device = device.lock().await;
                let topic = topics::commands(device.namespace(), device.device_id());
                (topic, device.on_command_message(&message))
            };
            let Some(ack) = ack else {
                return;
            };
            match publish_json(channel, &topic, &ack).await {
                Ok(()) => tracing::info!(command_id = %ack.command_id, "command acknowledged"),
                Err(e) => tracing::warn!(error = %e, "failed to publish command ack"),
            }
        }
        IncomingMessage::ShadowUpdate { .. } | IncomingMessage::Event(_) => {}
        IncomingMessage::Unknown { topic, .. } => {
            tracing::debug!(topic = %topic, "ignoring unrecognized message");
        }
    }
}

async fn is_ours(device: &SharedDevice, device_id: &str) -> bool {
    let ours = device.lock().await.device_id() == device_id;
    if !ours {
        tracing::debug!(device_id = %device_id, "message for another device");
    }
    ours
}

async fn publish_diagnostic<C: Channel + ?Sized>(channel: &C, device: &SharedDevice, error: &str) {
    let (topic, event) = {
        let device = device.lock().await;
        let event = DeviceEvent::new(
            device.device_id(),
            EventType::Diagnostic,
            format!("An error occurred: {error}"),
            EventDetails {
                event_id: "shadow-delta-error".into(),
                sensor_id: None,
                sensor: None,
                value: json!(error),
            },
        );
        (topics::event(device.namespace(), device.device_id()), event)
    };
    if let Err(e) = publish_json(channel, &topic, &event).await {
        tracing::warn!(error = %e, "failed to publish diagnostic event");
    }
}
