//! MQTT channel error types.

use thiserror::Error;

/// Errors that can occur during MQTT operations.
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("subscribe error: {0}")]
    Subscribe(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MqttError {
    fn from(e: serde_json::Error) -> Self {
        MqttError::Serialization(e.to_string())
    }
}

/// Convenience alias for MQTT results.
pub type MqttResult<T> = Result<T, MqttError>;
