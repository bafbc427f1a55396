//! Power-on state for each simulated model.

use serde_json::{Map, Value, json};
use sp_commands::DeviceModel;

/// Number of fans on a simulated controller bus.
pub const CONTROLLER_FAN_COUNT: u8 = 8;

/// Reported value of `activeFault` for a healthy fan.
pub const NO_FAULT: &str = "No Fault";

/// Initial state tree for `model`.
pub fn initial_state(model: DeviceModel) -> Value {
    match model {
        DeviceModel::Hvac => json!({
            "powerStatus": "OFF",
            "actualTemperature": 71.5,
            "targetTemperature": 71.5,
        }),
        DeviceModel::SimController => controller_state(CONTROLLER_FAN_COUNT),
        DeviceModel::SimFan => controller_state(1),
    }
}

fn controller_state(fan_count: u8) -> Value {
    let fans: Map<String, Value> = (1..=fan_count)
        .map(|address| (address.to_string(), fan_state()))
        .collect();
    json!({
        "instanceNumber": "3FFFFF",
        "autoIdealTemperature": 23.3,
        "actualTemperature": 23.3,
        "fan": fans,
    })
}

fn fan_state() -> Value {
    json!({
        "fanType": "Powerfoil X",
        "power": true,
        "commandedSpeedPercent": 10.0,
        "actualSpeedPercent": 10.0,
        "isForward": true,
        "resetFaults": false,
        "autoEnable": true,
        "activeFault": NO_FAULT,
    })
}
