//! MQTT bridge: consumes device acks and events from the broker.

use rumqttc::{Event, Packet};

use sp_mqtt_channel::{IncomingMessage, classify};
use sp_protocol::CommandChannelMessage;

use crate::events::WsEvent;
use crate::state::AppState;

/// Run the MQTT bridge event loop.
///
/// Drives the rumqttc `EventLoop` and dispatches every incoming publish.
pub async fn run(mut eventloop: rumqttc::EventLoop, state: AppState) {
    tracing::info!("mqtt bridge started");

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handle_incoming(classify(&publish), &state).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "mqtt event loop error, reconnecting in 5s");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        }
    }
}

pub async fn handle_incoming(message: IncomingMessage, state: &AppState) {
    match message {
        IncomingMessage::Command {
            message: CommandChannelMessage::Ack(ack),
            ..
        } => {
            if let Err(e) = state.commands.acknowledge(&ack).await {
                tracing::error!(command_id = %ack.command_id, error = %e, "failed to record ack");
            }
        }
        // Our own notifications, echoed back on the shared topic.
        IncomingMessage::Command { .. } => {}
        IncomingMessage::Event(event) => {
            tracing::info!(
                device_id = %event.device_id,
                event_id = %event.details.event_id,
                "device event"
            );
            let _ = state.event_tx.send(WsEvent::DeviceEventReceived { event });
        }
        IncomingMessage::ShadowDelta { .. } | IncomingMessage::ShadowUpdate { .. } => {}
        IncomingMessage::Unknown { topic, .. } => {
            tracing::debug!(topic = %topic, "ignoring unhandled mqtt topic");
        }
    }
}
