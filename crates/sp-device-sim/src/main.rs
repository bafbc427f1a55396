//! SmartProduct device simulator.
//!
//! Connects one simulated device to the broker, reconciles shadow deltas,
//! acknowledges commands and publishes telemetry and state reports.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use sp_device_sim::config::DeviceConfig;
use sp_device_sim::reconciler::Device;
use sp_device_sim::{mqtt_loop, shadow_sync, telemetry};
use sp_mqtt_channel::{MqttChannel, ShadowClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sp-device-sim starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/smartproduct/device.toml".to_string());

    let config = DeviceConfig::from_file(&config_path)?;
    tracing::info!(
        device_id = %config.device_id,
        model_number = %config.model_number,
        "config loaded"
    );

    let device = Device::for_model_number(
        &config.device_id,
        &config.namespace,
        &config.model_number,
        config.simulation.clone(),
    )?
    .shared();

    // ── MQTT channel ────────────────────────────────────────────
    if !config.mqtt.use_tls {
        tracing::info!("MQTT plaintext mode (no TLS)");
    }
    let (channel, eventloop) = MqttChannel::new(&config.mqtt, &config.namespace, &config.device_id)?;

    channel.subscribe_commands().await?;
    ShadowClient::new(&channel, &config.device_id)
        .subscribe_delta()
        .await?;
    tracing::info!("MQTT subscriptions active");

    tracing::info!("sp-device-sim ready");

    tokio::select! {
        () = mqtt_loop::run(eventloop, &channel, &device) => {
            tracing::error!("MQTT loop exited unexpectedly");
        }
        () = telemetry::run(
            &channel,
            &device,
            Duration::from_secs(config.telemetry_interval_secs),
            StdRng::from_entropy(),
        ) => {
            tracing::error!("telemetry loop exited unexpectedly");
        }
        () = shadow_sync::run(
            &channel,
            &device,
            Duration::from_secs(config.report_interval_secs),
            StdRng::from_entropy(),
        ) => {
            tracing::error!("shadow sync loop exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    if let Err(e) = channel.disconnect().await {
        tracing::warn!(error = %e, "disconnect failed");
    }
    tracing::info!("sp-device-sim stopped");
    Ok(())
}
