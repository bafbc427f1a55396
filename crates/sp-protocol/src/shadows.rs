use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reported/desired sections of a shadow update document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowDocument {
    /// State reported by the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported: Option<Value>,
    /// State desired by the cloud. Explicit nulls delete keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<Value>,
}

/// Message published on `$aws/things/{thing}/shadow/update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowUpdate {
    pub state: ShadowDocument,
}

impl ShadowUpdate {
    /// Update carrying only a desired-state patch.
    pub fn desired(patch: Value) -> Self {
        Self {
            state: ShadowDocument {
                reported: None,
                desired: Some(patch),
            },
        }
    }

    /// Update carrying only reported state.
    pub fn reported(state: Value) -> Self {
        Self {
            state: ShadowDocument {
                reported: Some(state),
                desired: None,
            },
        }
    }

    pub fn with_desired(mut self, patch: Value) -> Self {
        self.state.desired = Some(patch);
        self
    }
}

/// Message published by the twin service on
/// `$aws/things/{thing}/shadow/update/delta` when desired state diverges
/// from reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowDelta {
    /// Shadow version this delta was computed from.
    pub version: u64,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Desired minus reported.
    pub state: Value,
}

/// Cloud-side view of a device twin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowState {
    #[serde(default)]
    pub reported: Value,
    #[serde(default)]
    pub desired: Value,
    /// Monotonically increasing version.
    pub version: u64,
    pub last_updated: DateTime<Utc>,
}

impl Default for ShadowState {
    fn default() -> Self {
        Self {
            reported: Value::Object(Map::new()),
            desired: Value::Object(Map::new()),
            version: 0,
            last_updated: Utc::now(),
        }
    }
}

impl ShadowState {
    /// Merge an update into both sections, bump the version and return the
    /// resulting delta.
    pub fn apply(&mut self, update: &ShadowUpdate) -> Value {
        if let Some(desired) = &update.state.desired {
            merge_patch(&mut self.desired, desired);
        }
        if let Some(reported) = &update.state.reported {
            merge_patch(&mut self.reported, reported);
        }
        self.version += 1;
        self.last_updated = Utc::now();
        self.delta()
    }

    pub fn delta(&self) -> Value {
        compute_delta(&self.desired, &self.reported)
    }

    /// Delta message for the current version, or `None` when in sync.
    pub fn delta_message(&self) -> Option<ShadowDelta> {
        let state = self.delta();
        if is_empty_object(&state) {
            return None;
        }
        Some(ShadowDelta {
            version: self.version,
            timestamp: self.last_updated.timestamp(),
            state,
        })
    }
}

/// JSON merge patch: objects merge recursively, `null` deletes the key,
/// anything else replaces the target.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(target_map) = target else {
        return;
    };

    for (key, value) in patch_map {
        if value.is_null() {
            target_map.remove(key);
        } else {
            merge_patch(
                target_map.entry(key.clone()).or_insert(Value::Null),
                value,
            );
        }
    }
}

/// Keys of `desired` whose values differ from `reported`, recursing into
/// nested objects. Subtrees with no differences are pruned.
pub fn compute_delta(desired: &Value, reported: &Value) -> Value {
    let Value::Object(desired_map) = desired else {
        return Value::Object(Map::new());
    };

    let mut delta = Map::new();
    for (key, want) in desired_map {
        let have = reported.get(key);
        match want {
            Value::Object(_) => {
                let nested = compute_delta(want, have.unwrap_or(&Value::Null));
                if !is_empty_object(&nested) {
                    delta.insert(key.clone(), nested);
                }
            }
            _ if have != Some(want) => {
                delta.insert(key.clone(), want.clone());
            }
            _ => {}
        }
    }
    Value::Object(delta)
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|m| m.is_empty())
}
