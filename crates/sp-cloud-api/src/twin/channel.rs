//! Twin and notifier over an MQTT `Channel`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use sp_mqtt_channel::{Channel, ShadowClient, publish_json};
use sp_protocol::{CommandNotification, topics};

use super::{Notifier, TwinError, TwinResult, TwinService};

pub struct ChannelTwin<C: Channel + ?Sized> {
    channel: Arc<C>,
    namespace: String,
}

impl<C: Channel + ?Sized> ChannelTwin<C> {
    pub fn new(channel: Arc<C>, namespace: impl Into<String>) -> Self {
        Self {
            channel,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl<C: Channel + ?Sized> TwinService for ChannelTwin<C> {
    async fn patch_desired(&self, device_id: &str, patch: &Value) -> TwinResult<()> {
        ShadowClient::new(self.channel.as_ref(), device_id)
            .update_desired(patch.clone())
            .await
            .map_err(|e| TwinError::Update {
                thing: device_id.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl<C: Channel + ?Sized> Notifier for ChannelTwin<C> {
    async fn notify(&self, notification: &CommandNotification) -> TwinResult<()> {
        let topic = topics::commands(&self.namespace, &notification.device_id);
        publish_json(self.channel.as_ref(), &topic, notification)
            .await
            .map_err(|e| TwinError::Publish {
                topic,
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sp_mqtt_channel::MockChannel;
    use sp_protocol::CommandStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn patch_goes_to_shadow_update_topic() {
        let mock = Arc::new(MockChannel::new());
        let twin = ChannelTwin::new(mock.clone(), "smartproduct");

        twin.patch_desired("dev-1", &json!({"fan": {"1": {"power": true}}}))
            .await
            .unwrap();

        let msg = mock.last_published().unwrap();
        assert_eq!(msg.topic, "$aws/things/dev-1/shadow/update");
        assert_eq!(msg.json()["state"]["desired"]["fan"]["1"]["power"], true);
    }

    #[tokio::test]
    async fn notification_goes_to_command_topic() {
        let mock = Arc::new(MockChannel::new());
        let twin = ChannelTwin::new(mock.clone(), "lab");
        let notification = CommandNotification {
            command_id: Uuid::new_v4(),
            device_id: "dev-1".into(),
            status: CommandStatus::Pending,
            details: json!({}),
        };

        twin.notify(&notification).await.unwrap();

        let msg = mock.last_published().unwrap();
        assert_eq!(msg.topic, "lab/commands/dev-1");
        assert_eq!(msg.json()["status"], "pending");
    }

    #[tokio::test]
    async fn publish_failure_maps_to_twin_error() {
        let mock = Arc::new(MockChannel::new());
        mock.set_fail_publish(true);
        let twin = ChannelTwin::new(mock, "smartproduct");

        let err = twin.patch_desired("dev-1", &json!({})).await.unwrap_err();
        assert!(matches!(err, TwinError::Update { ref thing, .. } if thing == "dev-1"));
    }
}
