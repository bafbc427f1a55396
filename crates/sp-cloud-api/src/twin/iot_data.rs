//! Twin and notifier over the AWS IoT data-plane HTTP API.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_iotdataplane::Client;
use aws_sdk_iotdataplane::primitives::Blob;
use serde_json::Value;

use sp_protocol::{CommandNotification, ShadowUpdate, topics};

use super::{Notifier, TwinError, TwinResult, TwinService};

pub struct IotDataTwin {
    client: Client,
    namespace: String,
}

impl IotDataTwin {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Build a client from the default AWS credential chain, pointed at the
    /// account's IoT data endpoint.
    pub async fn connect(endpoint: &str, namespace: impl Into<String>) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let config = aws_sdk_iotdataplane::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint)
            .build();
        tracing::info!(endpoint = %endpoint, "IoT data-plane client configured");
        Self::new(Client::from_conf(config), namespace)
    }
}

#[async_trait]
impl TwinService for IotDataTwin {
    async fn patch_desired(&self, device_id: &str, patch: &Value) -> TwinResult<()> {
        let payload = serde_json::to_vec(&ShadowUpdate::desired(patch.clone()))?;
        self.client
            .update_thing_shadow()
            .thing_name(device_id)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| TwinError::Update {
                thing: device_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for IotDataTwin {
    async fn notify(&self, notification: &CommandNotification) -> TwinResult<()> {
        let topic = topics::commands(&self.namespace, &notification.device_id);
        let payload = serde_json::to_vec(notification)?;
        self.client
            .publish()
            .topic(&topic)
            .qos(1)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| TwinError::Publish {
                topic: topic.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
