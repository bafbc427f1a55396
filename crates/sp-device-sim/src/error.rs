use thiserror::Error;

/// Errors raised by the simulated device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no simulator for model '{0}'")]
    UnknownModel(String),

    #[error("delta state must be a JSON object, got {0}")]
    InvalidDelta(String),

    #[error("failed to read config '{path}': {reason}")]
    Config { path: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Mqtt(#[from] sp_mqtt_channel::MqttError),
}

pub type DeviceResult<T> = Result<T, DeviceError>;
