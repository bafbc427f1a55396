//! End-to-end failure paths: nothing is written for rejected commands,
//! and side-effect failures leave the stored command pending.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use helpers::{CONTROLLER, HVAC, TestHarness, USER};
use serde_json::json;
use sp_cloud_api::CommandError;
use sp_cloud_api::service::CommandService;
use sp_cloud_api::state::sample_registrations;
use sp_cloud_api::store::{
    CommandPage, CommandQuery, CommandStore, MemoryStore, RegistrationStore, StoreResult,
};
use sp_cloud_api::twin::MemoryTwin;
use sp_commands::CommandCatalog;
use sp_protocol::{Command, CommandStatus, Ticket};
use uuid::Uuid;

/// Command store that counts writes before delegating.
struct CountingStore {
    inner: MemoryStore,
    puts: AtomicUsize,
}

#[async_trait]
impl CommandStore for CountingStore {
    async fn put_command(&self, command: &Command) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put_command(command).await
    }

    async fn get_command(&self, device_id: &str, command_id: Uuid) -> StoreResult<Option<Command>> {
        self.inner.get_command(device_id, command_id).await
    }

    async fn query_commands(&self, query: &CommandQuery) -> StoreResult<CommandPage> {
        self.inner.query_commands(query).await
    }

    async fn update_status(
        &self,
        command_id: Uuid,
        status: CommandStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Command>> {
        self.inner.update_status(command_id, status, updated_at).await
    }
}

#[tokio::test]
async fn e2e_out_of_range_temperature_never_reaches_store() {
    let registrations = Arc::new(MemoryStore::with_registrations(sample_registrations()));
    let commands = Arc::new(CountingStore {
        inner: MemoryStore::new(),
        puts: AtomicUsize::new(0),
    });
    let twin = Arc::new(MemoryTwin::new());
    let service = CommandService::new(
        registrations,
        commands.clone(),
        twin.clone(),
        twin.clone(),
        CommandCatalog::builtin().unwrap(),
    );

    let err = service
        .create_command(
            &Ticket::new(USER),
            HVAC,
            json!({
                "commandDetails": {"command": "set-temp", "value": 150},
                "shadowDetails": {
                    "powerStatus": "HEAT",
                    "actualTemperature": 71.5,
                    "targetTemperature": 150
                }
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::InvalidParameter(_)));
    assert_eq!(commands.puts.load(Ordering::SeqCst), 0);
    assert!(twin.shadow(HVAC).await.is_none());
    assert!(twin.notifications().await.is_empty());
}

#[tokio::test]
async fn e2e_address_boundaries() {
    let harness = TestHarness::with_controller().await;
    let cmd = |address: i64| json!({"command": "set-fan-power", "value": true, "address": address});

    let (status, _) = harness.send_command(CONTROLLER, cmd(0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = harness.send_command(CONTROLLER, cmd(248)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.send_command(CONTROLLER, cmd(1)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = harness.send_command(CONTROLLER, cmd(247)).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(harness.store.command_count().await, 2);
}

#[tokio::test]
async fn e2e_unknown_command_segment_rejected() {
    let harness = TestHarness::with_controller().await;
    let (status, json) = harness
        .send_command(CONTROLLER, json!({"command": "set-fan-turbo", "value": true, "address": 1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "InvalidParameter");
    assert_eq!(harness.store.command_count().await, 0);
}

#[tokio::test]
async fn e2e_extra_fields_are_ignored() {
    let harness = TestHarness::with_controller().await;
    let (status, _) = harness
        .send_command(
            CONTROLLER,
            json!({"command": "set-autoIdealTemperature", "value": 21, "comment": "cooler"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn e2e_unregistered_device_is_rejected() {
    let harness = TestHarness::with_controller().await;
    let (status, json) = harness
        .send_command("controller-999", json!({"command": "set-fan-power", "value": true, "address": 1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "MissingRegistration");
    assert_eq!(harness.store.command_count().await, 0);
}

#[tokio::test]
async fn e2e_unknown_model_is_rejected() {
    let harness = TestHarness::with_controller().await;
    harness
        .store
        .put_registration(&sp_protocol::DeviceRegistration::new(USER, "toaster-1", "toaster"))
        .await
        .unwrap();

    let (status, json) = harness
        .send_command("toaster-1", json!({"command": "set-power", "value": true}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "UnknownModel");
}

#[tokio::test]
async fn e2e_notify_failure_keeps_pending_record() {
    let harness = TestHarness::with_controller().await;
    harness.twin.set_fail_notify(true);

    let (status, json) = harness
        .send_command(CONTROLLER, json!({"command": "set-fan-power", "value": false, "address": 6}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "NotifyFailure");

    // The twin was still patched, and the record is recoverable as pending.
    let shadow = harness.twin.shadow(CONTROLLER).await.unwrap();
    assert_eq!(shadow.desired["fan"]["6"]["power"], false);

    let pending = harness
        .cloud_state
        .commands
        .get_commands(&harness.ticket(), CONTROLLER, Some(CommandStatus::Pending), None)
        .await
        .unwrap();
    assert_eq!(pending.items.len(), 1);
}

#[tokio::test]
async fn e2e_invalid_delta_reported_as_diagnostic() {
    let mut harness = TestHarness::with_controller().await;
    let msg = sp_mqtt_channel::IncomingMessage::ShadowDelta {
        device_id: CONTROLLER.into(),
        delta: sp_protocol::ShadowDelta {
            version: 9,
            timestamp: 0,
            state: json!(42),
        },
    };
    sp_device_sim::mqtt_loop::handle_message(msg, &harness.device_mqtt, &harness.device).await;
    harness.pump_device().await;

    let event = loop {
        match harness.event_rx.try_recv() {
            Ok(sp_cloud_api::events::WsEvent::DeviceEventReceived { event }) => break event,
            Ok(_) => continue,
            Err(e) => panic!("no device event broadcast: {e}"),
        }
    };
    assert_eq!(event.device_id, CONTROLLER);
    assert_eq!(event.details.event_id, "shadow-delta-error");
}
