//! TLS configuration for mTLS connections to AWS IoT Core.
//!
//! Reads the X.509 client certificate, private key and CA certificate
//! from PEM files and configures rumqttc's TLS transport.

use rumqttc::Transport;

use crate::config::MqttConfig;
use crate::error::{MqttError, MqttResult};

/// Build a TLS transport from certificate file paths in the config.
pub fn load_tls_transport(config: &MqttConfig) -> MqttResult<Transport> {
    let ca = read_pem("CA cert", &config.ca_cert_path)?;
    let client_cert = read_pem("client cert", &config.client_cert_path)?;
    let client_key = read_pem("client key", &config.client_key_path)?;

    Ok(Transport::tls_with_config(
        rumqttc::TlsConfiguration::Simple {
            ca,
            alpn: None,
            client_auth: Some((client_cert, client_key)),
        },
    ))
}

/// Transport selected by `config.use_tls`.
pub fn transport_for(config: &MqttConfig) -> MqttResult<Transport> {
    if config.use_tls {
        load_tls_transport(config)
    } else {
        Ok(Transport::Tcp)
    }
}

fn read_pem(label: &str, path: &str) -> MqttResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| MqttError::Tls(format!("failed to read {label} '{path}': {e}")))
}
