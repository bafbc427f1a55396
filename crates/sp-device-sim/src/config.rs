//! Simulator configuration, loadable from TOML.

use serde::Deserialize;
use sp_mqtt_channel::MqttConfig;
use sp_protocol::topics::DEFAULT_NAMESPACE;

use crate::error::{DeviceError, DeviceResult};

/// Top-level configuration for one simulated device.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier (IoT Core thing name).
    pub device_id: String,
    /// Hardware model to simulate ("sim-controller", "sim-fan", "test-model").
    pub model_number: String,
    /// Topic namespace for commands, telemetry and events.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// MQTT connection settings.
    pub mqtt: MqttConfig,
    /// Telemetry publish interval in seconds.
    #[serde(default = "default_telemetry_interval")]
    pub telemetry_interval_secs: u64,
    /// Shadow report interval in seconds.
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Tunables for the background state perturbation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Fan speed change in percent per second.
    #[serde(default = "default_acceleration")]
    pub acceleration_percent_per_sec: f64,
    /// Chance per report cycle that a healthy fan develops a fault.
    #[serde(default = "default_fault_probability")]
    pub fault_probability: f64,
    /// Faults a fan can develop.
    #[serde(default = "default_faults")]
    pub faults: Vec<String>,
    /// Temperature drift per telemetry tick for HVAC units.
    #[serde(default = "default_temperature_step")]
    pub temperature_step: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            acceleration_percent_per_sec: default_acceleration(),
            fault_probability: default_fault_probability(),
            faults: default_faults(),
            temperature_step: default_temperature_step(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_telemetry_interval() -> u64 {
    10
}

fn default_report_interval() -> u64 {
    30
}

fn default_acceleration() -> f64 {
    5.0
}

fn default_fault_probability() -> f64 {
    0.01
}

fn default_faults() -> Vec<String> {
    ["Motor Overheat", "Over Current", "Under Voltage", "Communication Loss"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_temperature_step() -> f64 {
    0.5
}

impl DeviceConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> DeviceResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| DeviceError::Config {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| DeviceError::Config {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}
