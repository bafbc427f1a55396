//! Fixed-schema strategy for HVAC thermostats.
//!
//! Input shape:
//! ```text
//! {
//!   commandDetails: { command: "set-temp" | "set-mode", value },
//!   shadowDetails:  { powerStatus: "HEAT" | "AC" | "OFF",
//!                     actualTemperature, targetTemperature }
//! }
//! ```
//! `commandDetails` is what gets persisted; `shadowDetails` is what gets
//! sent to the device twin.

use serde_json::{Value, json};

use crate::schema::as_number;

pub const COMMAND_MODES: &[&str] = &["set-temp", "set-mode"];
pub const POWER_STATUSES: &[&str] = &["HEAT", "AC", "OFF"];
pub const TARGET_TEMPERATURE_MIN: f64 = 50.0;
pub const TARGET_TEMPERATURE_MAX: f64 = 110.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HvacCommand {
    raw: Value,
}

impl HvacCommand {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Validate the command. For `set-temp`, the target temperature is
    /// normalized in place and mirrored into `commandDetails.value`.
    pub fn validate(&mut self) -> bool {
        let Some(mode) = self.command_field("command").and_then(Value::as_str) else {
            return false;
        };
        if !COMMAND_MODES.contains(&mode) {
            return false;
        }
        let is_set_temp = mode == "set-temp";

        let power_ok = self
            .shadow_field("powerStatus")
            .and_then(Value::as_str)
            .is_some_and(|p| POWER_STATUSES.contains(&p));
        if !power_ok {
            return false;
        }

        let Some(target) = self.shadow_field("targetTemperature").and_then(as_number) else {
            return false;
        };
        if !(TARGET_TEMPERATURE_MIN..=TARGET_TEMPERATURE_MAX).contains(&target) {
            return false;
        }

        if is_set_temp {
            if self.command_field("value").and_then(as_number).is_none() {
                return false;
            }
            let normalized = normalize_temperature(target);
            self.raw["shadowDetails"]["targetTemperature"] = normalized.clone();
            self.raw["commandDetails"]["value"] = normalized;
        }
        true
    }

    /// Payload persisted with the command record.
    pub fn details(&self) -> Value {
        json!({
            "command": self.command_field("command").cloned().unwrap_or(Value::Null),
            "value": self.command_field("value").cloned().unwrap_or(Value::Null),
        })
    }

    /// Desired-state patch for the device twin.
    pub fn shadow_details(&self) -> Value {
        let field = |key: &str| self.shadow_field(key).cloned().unwrap_or(Value::Null);
        json!({
            "powerStatus": field("powerStatus"),
            "actualTemperature": field("actualTemperature"),
            "targetTemperature": field("targetTemperature"),
        })
    }

    fn command_field(&self, key: &str) -> Option<&Value> {
        self.raw.get("commandDetails")?.as_object()?.get(key)
    }

    fn shadow_field(&self, key: &str) -> Option<&Value> {
        self.raw.get("shadowDetails")?.as_object()?.get(key)
    }
}

/// Round to hundredths (half away from zero). Whole numbers come back as
/// JSON integers, everything else as a float with at most two decimals.
pub fn normalize_temperature(value: f64) -> Value {
    let hundredths = (value * 100.0).round() as i64;
    if hundredths % 100 == 0 {
        json!(hundredths / 100)
    } else {
        json!(hundredths as f64 / 100.0)
    }
}
