//! End-to-end device simulation: fault handling through the twin and
//! events reaching cloud listeners.

mod helpers;

use axum::http::StatusCode;
use helpers::{CONTROLLER, TestHarness};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use sp_cloud_api::events::WsEvent;
use sp_device_sim::{shadow_sync, telemetry};
use sp_protocol::topics;

#[tokio::test]
async fn e2e_reset_faults_clears_fault_and_emits_event() {
    let mut harness = TestHarness::with_controller().await;
    harness.device.lock().await.state_mut()["fan"]["3"]["activeFault"] = json!("Over Current");

    let (status, _) = harness
        .send_command(CONTROLLER, json!({"command": "set-fan-resetFaults", "address": 3}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    harness.deliver_delta().await;
    harness.pump_device().await;

    let mut rng = StdRng::seed_from_u64(7);
    shadow_sync::report_cycle(&harness.device_mqtt, &harness.device, &mut rng).await;
    harness.pump_device().await;

    let shadow = harness.twin.shadow(CONTROLLER).await.unwrap();
    assert_eq!(shadow.reported["fan"]["3"]["resetFaults"], false);
    assert_eq!(shadow.reported["fan"]["3"]["activeFault"], "No Fault");
    assert!(harness.twin.delta_message(CONTROLLER).await.is_none());

    let mut cleared = None;
    while let Ok(event) = harness.event_rx.try_recv() {
        if let WsEvent::DeviceEventReceived { event } = event {
            cleared = Some(event);
        }
    }
    let cleared = cleared.expect("fault-cleared event broadcast");
    assert_eq!(cleared.details.event_id, "fan-fault-cleared");
    assert_eq!(cleared.device_id, CONTROLLER);
}

#[tokio::test]
async fn e2e_telemetry_snapshot_published() {
    let harness = TestHarness::with_controller().await;
    let mut rng = StdRng::seed_from_u64(1);

    telemetry::publish_snapshot(&harness.device_mqtt, &harness.device, &mut rng)
        .await
        .unwrap();

    let topic = topics::telemetry(topics::DEFAULT_NAMESPACE, CONTROLLER);
    let published = harness.device_mqtt.published_to(&topic);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].json()["deviceId"], CONTROLLER);

    // Telemetry is not consumed by the cloud bridge; pumping it is harmless.
    harness.pump_device().await;
}
