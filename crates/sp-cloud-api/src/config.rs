//! Cloud API server configuration.

use serde::Deserialize;
use sp_protocol::topics::DEFAULT_NAMESPACE;

/// Default number of commands returned per list request.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Top-level API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// PostgreSQL connection URL. In-memory stores when unset.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Topic namespace for command notifications.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Minimum number of commands gathered per list page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// MQTT broker for the twin/notify transport and the ack bridge.
    #[serde(default)]
    pub mqtt_broker_host: Option<String>,
    #[serde(default = "default_mqtt_port")]
    pub mqtt_broker_port: u16,
    /// AWS IoT data-plane endpoint. Takes precedence over MQTT for twin
    /// updates and notifications when set.
    #[serde(default)]
    pub iot_data_endpoint: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_mqtt_port() -> u16 {
    1883
}

impl ApiConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("API_HOST").unwrap_or(defaults.host),
            port: non_empty("API_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            database_url: non_empty("DATABASE_URL"),
            namespace: non_empty("COMMAND_NAMESPACE").unwrap_or(defaults.namespace),
            page_size: non_empty("COMMAND_PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.page_size),
            mqtt_broker_host: non_empty("MQTT_BROKER_HOST"),
            mqtt_broker_port: non_empty("MQTT_BROKER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.mqtt_broker_port),
            iot_data_endpoint: non_empty("IOT_DATA_ENDPOINT"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            namespace: default_namespace(),
            page_size: default_page_size(),
            mqtt_broker_host: None,
            mqtt_broker_port: default_mqtt_port(),
            iot_data_endpoint: None,
        }
    }
}
