//! Shared test harness for E2E integration tests.
//!
//! Wires the cloud command service (in-memory store and twin) to a
//! simulated device. Messages the device publishes land on a
//! `MockChannel`; `pump_device` routes them to the twin and the cloud
//! bridge, the way the broker and IoT rules would.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use rumqttc::{Publish, QoS};
use tokio::sync::broadcast;
use tower::ServiceExt;

use sp_cloud_api::events::WsEvent;
use sp_cloud_api::routes::{USER_ID_HEADER, build_router};
use sp_cloud_api::state::{AppState, sample_registrations};
use sp_cloud_api::store::MemoryStore;
use sp_cloud_api::twin::MemoryTwin;
use sp_commands::DeviceModel;
use sp_device_sim::{Device, SharedDevice, SimulationConfig, mqtt_loop, shadow_sync};
use sp_mqtt_channel::{IncomingMessage, MockChannel, classify};
use sp_protocol::{Command, CommandNotification, Ticket, topics};

pub const USER: &str = "demo-user";
pub const CONTROLLER: &str = "controller-001";
pub const HVAC: &str = "hvac-001";

pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub twin: Arc<MemoryTwin>,
    pub cloud_state: AppState,
    pub cloud_router: Router,
    /// What the device published since the last pump.
    pub device_mqtt: MockChannel,
    pub device: SharedDevice,
    pub event_rx: broadcast::Receiver<WsEvent>,
}

impl TestHarness {
    /// Sample registrations, with a fault-free controller attached.
    pub async fn with_controller() -> Self {
        Self::with_device(CONTROLLER, DeviceModel::SimController).await
    }

    pub async fn with_device(device_id: &str, model: DeviceModel) -> Self {
        let store = Arc::new(MemoryStore::with_registrations(sample_registrations()));
        let twin = Arc::new(MemoryTwin::new());
        let cloud_state = AppState::in_memory(store.clone(), twin.clone()).unwrap();
        let event_rx = cloud_state.event_tx.subscribe();
        let cloud_router = build_router(cloud_state.clone());

        let device = Device::new(
            device_id,
            topics::DEFAULT_NAMESPACE,
            model,
            SimulationConfig {
                fault_probability: 0.0,
                ..SimulationConfig::default()
            },
        )
        .shared();

        let harness = Self {
            store,
            twin,
            cloud_state,
            cloud_router,
            device_mqtt: MockChannel::new(),
            device,
            event_rx,
        };

        // Boot report, so the twin knows the reported state.
        shadow_sync::report_state(&harness.device_mqtt, &harness.device)
            .await
            .unwrap();
        harness.pump_device().await;
        harness
    }

    pub fn ticket(&self) -> Ticket {
        Ticket::new(USER)
    }

    pub async fn device_id(&self) -> String {
        self.device.lock().await.device_id().to_string()
    }

    /// POST a raw command through the REST API.
    pub async fn send_command(
        &self,
        device_id: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = self
            .cloud_router
            .clone()
            .oneshot(
                Request::post(format!("/api/v1/devices/{device_id}/commands"))
                    .header("content-type", "application/json")
                    .header(USER_ID_HEADER, USER)
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Deliver the twin's pending delta to the device, if there is one.
    pub async fn deliver_delta(&self) -> bool {
        let device_id = self.device_id().await;
        let Some(delta) = self.twin.delta_message(&device_id).await else {
            return false;
        };
        let msg = IncomingMessage::ShadowDelta { device_id, delta };
        mqtt_loop::handle_message(msg, &self.device_mqtt, &self.device).await;
        true
    }

    /// Deliver the notification of `command_id` to the device.
    pub async fn deliver_notification(&self, command_id: uuid::Uuid) {
        let notification = self
            .twin
            .notifications()
            .await
            .into_iter()
            .find(|n| n.command_id == command_id)
            .expect("notification was sent");
        let msg = classify(&as_publish(&notification));
        mqtt_loop::handle_message(msg, &self.device_mqtt, &self.device).await;
    }

    /// Route everything the device published: shadow reports go to the
    /// twin, acks and events to the cloud bridge.
    pub async fn pump_device(&self) {
        for published in self.device_mqtt.drain() {
            let publish = Publish::new(published.topic, QoS::AtLeastOnce, published.payload);
            match classify(&publish) {
                IncomingMessage::ShadowUpdate { device_id, update } => {
                    self.twin.report(&device_id, &update).await;
                }
                other => {
                    sp_cloud_api::mqtt_bridge::handle_incoming(other, &self.cloud_state).await;
                }
            }
        }
    }

    pub async fn stored_command(&self, device_id: &str, command_id: uuid::Uuid) -> Command {
        self.cloud_state
            .commands
            .get_command(&self.ticket(), device_id, command_id)
            .await
            .unwrap()
    }
}

fn as_publish(notification: &CommandNotification) -> Publish {
    Publish::new(
        topics::commands(topics::DEFAULT_NAMESPACE, &notification.device_id),
        QoS::AtLeastOnce,
        serde_json::to_vec(notification).unwrap(),
    )
}
