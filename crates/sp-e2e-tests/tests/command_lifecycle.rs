//! End-to-end command lifecycle: REST create, twin delta, device
//! reconciliation, echo handshake, acknowledgment.

mod helpers;

use axum::http::StatusCode;
use helpers::{CONTROLLER, HVAC, TestHarness};
use serde_json::json;
use sp_cloud_api::events::WsEvent;
use sp_commands::DeviceModel;
use sp_protocol::CommandStatus;
use uuid::Uuid;

#[tokio::test]
async fn e2e_fan_speed_command_round_trip() {
    let mut harness = TestHarness::with_controller().await;

    let (status, json) = harness
        .send_command(
            CONTROLLER,
            json!({"command": "set-fan-commandedSpeedPercent", "value": 42, "address": 5}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "pending");
    let command_id: Uuid = json["commandId"].as_str().unwrap().parse().unwrap();
    assert!(matches!(
        harness.event_rx.try_recv(),
        Ok(WsEvent::CommandCreated { .. })
    ));

    // Twin carries the merge patch; siblings of the patched leaf untouched.
    let shadow = harness.twin.shadow(CONTROLLER).await.unwrap();
    assert_eq!(shadow.desired, json!({"fan": {"5": {"commandedSpeedPercent": 42}}}));

    // Device applies the delta and reports with its echo.
    assert!(harness.deliver_delta().await);
    {
        let device = harness.device.lock().await;
        assert_eq!(device.state()["fan"]["5"]["commandedSpeedPercent"], 42);
        assert_eq!(device.state()["fan"]["5"]["isForward"], true);
    }
    harness.pump_device().await;

    // Echo handshake: nothing left to reconcile.
    assert!(harness.twin.delta_message(CONTROLLER).await.is_none());
    assert!(!harness.deliver_delta().await);

    // Notification arrives, device acks, cloud records success.
    harness.deliver_notification(command_id).await;
    harness.pump_device().await;

    let stored = harness.stored_command(CONTROLLER, command_id).await;
    assert_eq!(stored.status, CommandStatus::Success);
    assert!(stored.updated_at >= stored.created_at);
    assert!(matches!(
        harness.event_rx.try_recv(),
        Ok(WsEvent::CommandStatusChanged { status: CommandStatus::Success, .. })
    ));
}

#[tokio::test]
async fn e2e_reset_faults_defaults_to_true() {
    let harness = TestHarness::with_controller().await;

    let (status, _) = harness
        .send_command(CONTROLLER, json!({"command": "set-fan-resetFaults", "address": 3}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let shadow = harness.twin.shadow(CONTROLLER).await.unwrap();
    assert_eq!(shadow.desired, json!({"fan": {"3": {"resetFaults": true}}}));

    harness.deliver_delta().await;
    assert_eq!(
        harness.device.lock().await.state()["fan"]["3"]["resetFaults"],
        true
    );
}

#[tokio::test]
async fn e2e_hvac_temperature_is_normalized() {
    let harness = TestHarness::with_device(HVAC, DeviceModel::Hvac).await;

    let (status, json) = harness
        .send_command(
            HVAC,
            json!({
                "commandDetails": {"command": "set-temp", "value": 72.456},
                "shadowDetails": {
                    "powerStatus": "HEAT",
                    "actualTemperature": 71.5,
                    "targetTemperature": 72.456
                }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["details"], json!({"command": "set-temp", "value": 72.46}));

    harness.deliver_delta().await;
    let device = harness.device.lock().await;
    assert_eq!(device.state()["targetTemperature"], json!(72.46));
    assert_eq!(device.state()["powerStatus"], "HEAT");
}

#[tokio::test]
async fn e2e_identical_commands_are_not_deduplicated() {
    let harness = TestHarness::with_controller().await;
    let body = json!({"command": "set-fan-power", "value": false, "address": 2});

    let (_, first) = harness.send_command(CONTROLLER, body.clone()).await;
    let (_, second) = harness.send_command(CONTROLLER, body).await;

    assert_ne!(first["commandId"], second["commandId"]);
    assert_eq!(harness.store.command_count().await, 2);
    assert_eq!(harness.twin.notifications().await.len(), 2);
}

#[tokio::test]
async fn e2e_notification_without_change_is_not_acked() {
    let harness = TestHarness::with_controller().await;
    let (_, json) = harness
        .send_command(CONTROLLER, json!({"command": "set-fan-power", "value": true, "address": 1}))
        .await;
    let command_id: Uuid = json["commandId"].as_str().unwrap().parse().unwrap();

    // Notification overtakes the delta: the device has nothing to confirm.
    harness.deliver_notification(command_id).await;
    harness.pump_device().await;

    let stored = harness.stored_command(CONTROLLER, command_id).await;
    assert_eq!(stored.status, CommandStatus::Pending);
}

#[tokio::test]
async fn e2e_listing_returns_newest_first() {
    let harness = TestHarness::with_controller().await;
    for address in 1..=3 {
        harness
            .send_command(
                CONTROLLER,
                json!({"command": "set-fan-isForward", "value": false, "address": address}),
            )
            .await;
    }

    let page = harness
        .cloud_state
        .commands
        .get_commands(&harness.ticket(), CONTROLLER, None, None)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.cursor.is_none());
    assert!(
        page.items
            .windows(2)
            .all(|w| w[0].updated_at >= w[1].updated_at)
    );
}
