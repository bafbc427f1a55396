//! Folds a flat command into a nested desired-state patch.
//!
//! ```text
//! {command: "set-fan-commandedSpeedPercent", value: 42, address: 5}
//!   -> {fan: {"5": {commandedSpeedPercent: 42}}}
//! ```

use serde_json::{Map, Value};

use crate::error::TransformError;
use crate::schema::as_integer;

/// Entity types keyed by bus address in the shadow tree.
pub const DEFAULT_ADDRESSABLE: &[&str] = &["fan"];

#[derive(Debug, Clone)]
pub struct ShadowTransform {
    addressable: Vec<String>,
}

impl Default for ShadowTransform {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESSABLE.iter().copied())
    }
}

impl ShadowTransform {
    pub fn new<I, S>(addressable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addressable: addressable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_addressable(&self, segment: &str) -> bool {
        self.addressable.iter().any(|s| s == segment)
    }

    /// Build the patch for `command`.
    ///
    /// The leading verb segment is dropped. A command with fewer than two
    /// segments yields `{}`. An absent `value` defaults to `true`; an explicit
    /// `null` is kept and deletes the key when merged.
    pub fn transform(&self, command: &Value) -> Result<Value, TransformError> {
        let name = match command.get("command") {
            Some(Value::String(name)) => name,
            _ => return Err(TransformError::MissingCommand),
        };

        let segments: Vec<&str> = name.split('-').collect();
        let Some((leaf, outer)) = segments.get(1..).and_then(<[&str]>::split_last) else {
            tracing::warn!(command = %name, "command has no path below its verb, empty patch");
            return Ok(Value::Object(Map::new()));
        };

        let value = command.get("value").cloned().unwrap_or(Value::Bool(true));

        let mut tree = singleton(leaf, value);
        for segment in outer.iter().rev() {
            tree = if self.is_addressable(segment) {
                let address = command
                    .get("address")
                    .and_then(as_integer)
                    .ok_or_else(|| TransformError::MissingAddress {
                        segment: segment.to_string(),
                    })?;
                singleton(segment, singleton(&address.to_string(), tree))
            } else {
                singleton(segment, tree)
            };
        }
        Ok(tree)
    }
}

fn singleton(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn controller_command() {
        let t = ShadowTransform::default();
        let patch = t
            .transform(&json!({"command": "set-autoIdealTemperature", "value": 42}))
            .unwrap();
        assert_eq!(patch, json!({"autoIdealTemperature": 42}));
    }

    #[test]
    fn zero_to_ten_command() {
        let t = ShadowTransform::default();
        let patch = t
            .transform(&json!({"command": "set-zeroToTen-autoEnable", "value": true}))
            .unwrap();
        assert_eq!(patch, json!({"zeroToTen": {"autoEnable": true}}));
    }

    #[test]
    fn addressed_fan_command() {
        let t = ShadowTransform::default();
        let patch = t
            .transform(&json!({
                "command": "set-fan-commandedSpeedPercent",
                "value": 42,
                "address": 5
            }))
            .unwrap();
        assert_eq!(patch, json!({"fan": {"5": {"commandedSpeedPercent": 42}}}));
    }

    #[test]
    fn value_defaults_to_true() {
        let t = ShadowTransform::default();
        let patch = t
            .transform(&json!({"command": "set-fan-resetFaults", "address": 3}))
            .unwrap();
        assert_eq!(patch, json!({"fan": {"3": {"resetFaults": true}}}));
    }

    #[test]
    fn explicit_false_is_kept() {
        let t = ShadowTransform::default();
        let patch = t
            .transform(&json!({"command": "set-fan-power", "value": false, "address": 9}))
            .unwrap();
        assert_eq!(patch, json!({"fan": {"9": {"power": false}}}));
    }

    #[test]
    fn explicit_null_passes_through() {
        let t = ShadowTransform::default();
        let patch = t
            .transform(&json!({"command": "set-fan-resetFaults", "value": null, "address": 3}))
            .unwrap();
        assert_eq!(patch, json!({"fan": {"3": {"resetFaults": null}}}));
    }

    #[test]
    fn single_segment_yields_empty_patch() {
        let t = ShadowTransform::default();
        assert_eq!(t.transform(&json!({"command": "set"})).unwrap(), json!({}));
        assert_eq!(t.transform(&json!({"command": ""})).unwrap(), json!({}));
    }

    #[test]
    fn missing_command_fails() {
        let t = ShadowTransform::default();
        assert_eq!(
            t.transform(&json!({"value": 1})),
            Err(TransformError::MissingCommand)
        );
        assert_eq!(t.transform(&Value::Null), Err(TransformError::MissingCommand));
    }

    #[test]
    fn addressable_without_address_fails() {
        let t = ShadowTransform::default();
        assert_eq!(
            t.transform(&json!({"command": "set-fan-power", "value": true})),
            Err(TransformError::MissingAddress {
                segment: "fan".into()
            })
        );
    }

    #[test]
    fn custom_addressable_types() {
        let t = ShadowTransform::new(["fan", "damper"]);
        let patch = t
            .transform(&json!({"command": "set-damper-openPercent", "value": 30, "address": 12}))
            .unwrap();
        assert_eq!(patch, json!({"damper": {"12": {"openPercent": 30}}}));
        assert!(!t.is_addressable("zeroToTen"));
    }
}
