//! Periodic telemetry publisher.
//!
//! Publishes a full snapshot of device state at a configurable interval.

use std::time::Duration;

use rand::Rng;
use tokio::time;

use sp_mqtt_channel::{Channel, MqttResult, publish_json};
use sp_protocol::topics;

use crate::reconciler::SharedDevice;

/// Run the telemetry loop, publishing at `interval`.
///
/// Runs until the task is cancelled. Publish failures are logged and the
/// loop keeps going.
pub async fn run<C, R>(channel: &C, device: &SharedDevice, interval: Duration, mut rng: R)
where
    C: Channel + ?Sized,
    R: Rng + Send,
{
    let mut ticker = time::interval(interval);
    // Skip the first tick (fires immediately).
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = publish_snapshot(channel, device, &mut rng).await {
            tracing::warn!(error = %e, "failed to publish telemetry");
        }
    }
}

/// Drift state one tick and publish the resulting snapshot.
pub async fn publish_snapshot<C, R>(channel: &C, device: &SharedDevice, rng: &mut R) -> MqttResult<()>
where
    C: Channel + ?Sized,
    R: Rng + ?Sized,
{
    let (topic, message) = {
        let mut device = device.lock().await;
        device.drift(rng);
        (
            topics::telemetry(device.namespace(), device.device_id()),
            device.telemetry(),
        )
    };

    publish_json(channel, &topic, &message).await?;
    tracing::debug!(topic = %topic, "telemetry published");
    Ok(())
}
