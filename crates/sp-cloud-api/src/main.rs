//! SmartProduct Cloud API: remote command REST server.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use sp_cloud_api::config::ApiConfig;
use sp_cloud_api::routes::build_router;
use sp_cloud_api::store::{CommandStore, MemoryStore, PgStore, RegistrationStore};
use sp_cloud_api::twin::{ChannelTwin, IotDataTwin, MemoryTwin, Notifier, TwinService};
use sp_cloud_api::{AppState, CommandService, mqtt_bridge, state};
use sp_commands::CommandCatalog;
use sp_mqtt_channel::{MqttChannel, MqttConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sp-cloud-api starting");

    let config = ApiConfig::from_env();
    let catalog = CommandCatalog::builtin().context("loading command schema")?;

    let (registrations, commands): (Arc<dyn RegistrationStore>, Arc<dyn CommandStore>) =
        if let Some(database_url) = &config.database_url {
            tracing::info!("connecting to PostgreSQL");
            let store = Arc::new(PgStore::connect(database_url).await?);
            (store.clone(), store)
        } else {
            tracing::warn!("DATABASE_URL not set, using in-memory store with sample registrations");
            let store = Arc::new(MemoryStore::with_registrations(state::sample_registrations()));
            (store.clone(), store)
        };

    // The broker connection also carries device acks back to us.
    let mut bridge = None;
    let mut mqtt_channel = None;
    if let Some(host) = &config.mqtt_broker_host {
        let mqtt_config = MqttConfig::plaintext(host, config.mqtt_broker_port, "sp-cloud-api");
        let (channel, eventloop) = MqttChannel::new(&mqtt_config, &config.namespace, "sp-cloud-api")?;
        channel.subscribe_all_commands().await?;
        channel.subscribe_all_events().await?;
        tracing::info!(host = %host, port = config.mqtt_broker_port, "MQTT bridge configured");
        mqtt_channel = Some(Arc::new(channel));
        bridge = Some(eventloop);
    }

    let (twin, notifier): (Arc<dyn TwinService>, Arc<dyn Notifier>) =
        if let Some(endpoint) = &config.iot_data_endpoint {
            let twin = Arc::new(IotDataTwin::connect(endpoint, config.namespace.clone()).await);
            (twin.clone(), twin)
        } else if let Some(channel) = &mqtt_channel {
            let twin = Arc::new(ChannelTwin::new(channel.clone(), config.namespace.clone()));
            (twin.clone(), twin)
        } else {
            tracing::warn!("no twin transport configured, using in-memory twin");
            let twin = Arc::new(MemoryTwin::new());
            (twin.clone(), twin)
        };

    let service = CommandService::new(registrations, commands, twin, notifier, catalog)
        .with_page_size(config.page_size);
    let state = AppState::new(service);

    if let Some(eventloop) = bridge {
        tokio::spawn(mqtt_bridge::run(eventloop, state.clone()));
    }

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
