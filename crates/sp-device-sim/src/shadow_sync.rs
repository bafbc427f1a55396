//! Periodic shadow state reporter.
//!
//! Each report cycle advances the simulation, publishes any resulting
//! events, then reports the full device state (plus the pending echo) to
//! the twin.

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time;

use sp_mqtt_channel::{Channel, MqttResult, ShadowClient, publish_json};
use sp_protocol::topics;

use crate::reconciler::SharedDevice;

/// Run the report loop at `interval`.
///
/// Reports immediately on boot, then at the configured interval.
pub async fn run<C, R>(channel: &C, device: &SharedDevice, interval: Duration, mut rng: R)
where
    C: Channel + ?Sized,
    R: Rng + Send,
{
    if let Err(e) = report_state(channel, device).await {
        tracing::warn!(error = %e, "failed to publish initial shadow report");
    }

    let mut ticker = time::interval(interval);
    // Skip the first tick (fires immediately).
    ticker.tick().await;

    loop {
        ticker.tick().await;
        report_cycle(channel, device, &mut rng).await;
    }
}

/// Simulate, publish events and report. Failures are logged only.
pub async fn report_cycle<C, R>(channel: &C, device: &SharedDevice, rng: &mut R)
where
    C: Channel + ?Sized,
    R: Rng + ?Sized,
{
    let (topic, events) = {
        let mut device = device.lock().await;
        let events = device.simulate(Instant::now(), rng);
        (topics::event(device.namespace(), device.device_id()), events)
    };

    for event in &events {
        tracing::info!(message = %event.message, "publishing device event");
        if let Err(e) = publish_json(channel, &topic, event).await {
            tracing::warn!(error = %e, "failed to publish device event");
        }
    }

    if let Err(e) = report_state(channel, device).await {
        tracing::warn!(error = %e, "failed to publish shadow update");
    }
}

/// Publish the device's current report document.
pub async fn report_state<C>(channel: &C, device: &SharedDevice) -> MqttResult<()>
where
    C: Channel + ?Sized,
{
    let (thing, update) = {
        let device = device.lock().await;
        (device.device_id().to_string(), device.report())
    };

    ShadowClient::new(channel, thing).publish_update(&update).await?;
    tracing::debug!(echo = update.state.desired.is_some(), "shadow state reported");
    Ok(())
}
