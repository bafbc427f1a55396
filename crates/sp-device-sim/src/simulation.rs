//! Background perturbation of device state between reports.
//!
//! Fans ramp their actual speed toward the commanded speed, occasionally
//! develop faults, and clear them when `resetFaults` is raised. HVAC units
//! drift their actual temperature according to `powerStatus`.

use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Map, Value, json};
use sp_commands::schema::as_number;
use sp_protocol::{DeviceEvent, EventDetails, EventType};

use crate::config::SimulationConfig;
use crate::state::NO_FAULT;

/// State change worth telling the cloud about.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    FaultRaised { address: String, fault: String },
    FaultCleared { address: String, fault: String },
}

impl SimEvent {
    pub fn into_event(self, device_id: &str) -> DeviceEvent {
        match self {
            SimEvent::FaultRaised { address, fault } => DeviceEvent::new(
                device_id,
                EventType::Error,
                format!("Fan {address} reported fault: {fault}"),
                EventDetails {
                    event_id: "fan-fault".into(),
                    sensor_id: Some(address),
                    sensor: Some("fan".into()),
                    value: Value::String(fault),
                },
            ),
            SimEvent::FaultCleared { address, fault } => DeviceEvent::new(
                device_id,
                EventType::Info,
                format!("Fan {address} fault cleared"),
                EventDetails {
                    event_id: "fan-fault-cleared".into(),
                    sensor_id: Some(address),
                    sensor: Some("fan".into()),
                    value: Value::String(fault),
                },
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// One report cycle: clear requested resets, ramp speeds over
    /// `elapsed`, then draw for new faults.
    pub fn step<R: Rng + ?Sized>(
        &self,
        state: &mut Value,
        elapsed: Duration,
        rng: &mut R,
    ) -> Vec<SimEvent> {
        let mut events = self.reset_faults(state);
        self.ramp_speeds(state, elapsed);
        events.extend(self.inject_faults(state, rng));
        events
    }

    /// Move each fan's actual speed toward its commanded speed without
    /// overshooting.
    pub fn ramp_speeds(&self, state: &mut Value, elapsed: Duration) {
        let max_step = self.config.acceleration_percent_per_sec * elapsed.as_secs_f64();
        for (address, fan) in fans_mut(state) {
            let commanded = fan.get("commandedSpeedPercent").and_then(as_number);
            let actual = fan.get("actualSpeedPercent").and_then(as_number);
            let (Some(commanded), Some(actual)) = (commanded, actual) else {
                continue;
            };

            let diff = commanded - actual;
            if diff == 0.0 {
                continue;
            }
            let next = if diff.abs() <= max_step {
                commanded
            } else {
                actual + diff.signum() * max_step
            };
            fan.insert("actualSpeedPercent".into(), json!(next));
            tracing::trace!(fan = %address, actual = next, commanded, "fan speed adjusted");
        }
    }

    /// Healthy fans fault with the configured probability.
    pub fn inject_faults<R: Rng + ?Sized>(&self, state: &mut Value, rng: &mut R) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for (address, fan) in fans_mut(state) {
            if !is_healthy(fan) {
                continue;
            }
            if rng.r#gen::<f64>() > self.config.fault_probability {
                continue;
            }
            let Some(fault) = self.config.faults.choose(rng) else {
                continue;
            };
            fan.insert("activeFault".into(), Value::String(fault.clone()));
            events.push(SimEvent::FaultRaised {
                address: address.clone(),
                fault: fault.clone(),
            });
        }
        events
    }

    /// Clear faults on fans with `resetFaults` raised, lowering the flag.
    pub fn reset_faults(&self, state: &mut Value) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for (address, fan) in fans_mut(state) {
            if fan.get("resetFaults") != Some(&Value::Bool(true)) {
                continue;
            }
            fan.insert("resetFaults".into(), Value::Bool(false));
            if is_healthy(fan) {
                continue;
            }
            let previous = fan.insert("activeFault".into(), Value::String(NO_FAULT.into()));
            let fault = previous
                .as_ref()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            events.push(SimEvent::FaultCleared {
                address: address.clone(),
                fault,
            });
        }
        events
    }

    /// Drift `actualTemperature` by one step according to `powerStatus`.
    pub fn drift_temperature<R: Rng + ?Sized>(&self, state: &mut Value, rng: &mut R) {
        let Some(actual) = state.get("actualTemperature").and_then(as_number) else {
            return;
        };
        let step = self.config.temperature_step;
        let change = match state.get("powerStatus").and_then(Value::as_str) {
            Some("HEAT") => step,
            Some("AC") => -step,
            _ if rng.gen_bool(0.5) => step,
            _ => -step,
        };
        let next = ((actual + change) * 100.0).round() / 100.0;
        if let Value::Object(map) = state {
            map.insert("actualTemperature".into(), json!(next));
        }
    }
}

fn fans_mut(state: &mut Value) -> impl Iterator<Item = (&String, &mut Map<String, Value>)> {
    state
        .get_mut("fan")
        .and_then(Value::as_object_mut)
        .into_iter()
        .flat_map(|fans| fans.iter_mut())
        .filter_map(|(address, fan)| fan.as_object_mut().map(|fan| (address, fan)))
}

fn is_healthy(fan: &Map<String, Value>) -> bool {
    match fan.get("activeFault").and_then(Value::as_str) {
        Some(fault) => fault == NO_FAULT,
        None => true,
    }
}
