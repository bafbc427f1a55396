//! Device-side twin reconciliation.
//!
//! A `Device` exclusively owns its state tree. Inbound deltas are flattened
//! into leaf paths and written into the state; the same paths come back as
//! an echo of nulls in the next report so the twin's delta clears once the
//! reported state catches up.

use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use serde_json::Value;
use tokio::sync::Mutex;

use sp_commands::DeviceModel;
use sp_protocol::{
    CommandAck, CommandChannelMessage, DeviceEvent, ShadowUpdate, TelemetryMessage,
};

use crate::config::SimulationConfig;
use crate::error::{DeviceError, DeviceResult};
use crate::paths::{LeafPath, echo_nulls, get_path, leaf_paths, set_path};
use crate::simulation::Simulator;
use crate::state::initial_state;

/// Device shared between the MQTT loop and the periodic timers. Every
/// handler holds the lock for its whole read-modify-write.
pub type SharedDevice = Arc<Mutex<Device>>;

pub struct Device {
    device_id: String,
    namespace: String,
    model: DeviceModel,
    state: Value,
    /// Leaf paths written by the most recent non-empty delta.
    changed_paths: Vec<LeafPath>,
    /// Set when a delta was applied and not yet acknowledged.
    dirty: bool,
    simulator: Simulator,
    last_adjusted: Instant,
}

impl Device {
    pub fn new(
        device_id: impl Into<String>,
        namespace: impl Into<String>,
        model: DeviceModel,
        simulation: SimulationConfig,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            namespace: namespace.into(),
            model,
            state: initial_state(model),
            changed_paths: Vec::new(),
            dirty: false,
            simulator: Simulator::new(simulation),
            last_adjusted: Instant::now(),
        }
    }

    /// Build from a model number string, failing on unknown models.
    pub fn for_model_number(
        device_id: impl Into<String>,
        namespace: impl Into<String>,
        model_number: &str,
        simulation: SimulationConfig,
    ) -> DeviceResult<Self> {
        let model: DeviceModel = model_number
            .parse()
            .map_err(|_| DeviceError::UnknownModel(model_number.to_string()))?;
        Ok(Self::new(device_id, namespace, model, simulation))
    }

    pub fn shared(self) -> SharedDevice {
        Arc::new(Mutex::new(self))
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn model(&self) -> DeviceModel {
        self.model
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Value {
        &mut self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn changed_paths(&self) -> &[LeafPath] {
        &self.changed_paths
    }

    /// Merge a twin delta into local state.
    ///
    /// Returns `true` when at least one leaf was written. An empty delta
    /// also forgets the previous echo.
    pub fn apply_delta(&mut self, delta: &Value) -> DeviceResult<bool> {
        if !delta.is_object() {
            return Err(DeviceError::InvalidDelta(kind_of(delta).to_string()));
        }

        self.changed_paths = leaf_paths(delta);
        if self.changed_paths.is_empty() {
            return Ok(false);
        }

        for path in &self.changed_paths {
            let value = get_path(delta, path).cloned().unwrap_or(Value::Null);
            set_path(&mut self.state, path, value);
        }
        tracing::info!(
            device_id = %self.device_id,
            paths = self.changed_paths.len(),
            "applied shadow delta"
        );

        self.dirty = true;
        Ok(true)
    }

    /// Echo of the last applied paths with every leaf set to `null`.
    pub fn desired_echo(&self) -> Option<Value> {
        (!self.changed_paths.is_empty()).then(|| echo_nulls(&self.changed_paths))
    }

    /// Shadow update reporting the full local state, plus the echo while
    /// one is pending.
    pub fn report(&self) -> ShadowUpdate {
        let mut update = ShadowUpdate::reported(self.state.clone());
        update.state.desired = self.desired_echo();
        update
    }

    pub fn telemetry(&self) -> TelemetryMessage {
        TelemetryMessage::snapshot(&self.device_id, &self.state)
    }

    /// React to a message on this device's command channel.
    ///
    /// A notification arriving after a delta was applied is acknowledged
    /// with success and clears the dirty flag. Acks (including our own,
    /// echoed back by the broker) are ignored.
    pub fn on_command_message(&mut self, message: &CommandChannelMessage) -> Option<CommandAck> {
        let CommandChannelMessage::Notification(notification) = message else {
            return None;
        };
        if !self.dirty {
            tracing::debug!(
                command_id = %notification.command_id,
                "command notification before any state change, not acknowledging"
            );
            return None;
        }
        self.dirty = false;
        Some(CommandAck::success(notification.command_id, &self.device_id))
    }

    /// Advance the simulation to `now`, returning events to publish.
    pub fn simulate<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> Vec<DeviceEvent> {
        let elapsed = now.saturating_duration_since(self.last_adjusted);
        self.last_adjusted = now;

        if !self.model.is_schema_driven() {
            return Vec::new();
        }
        self.simulator
            .step(&mut self.state, elapsed, rng)
            .into_iter()
            .map(|event| event.into_event(&self.device_id))
            .collect()
    }

    /// Per-telemetry-tick drift, for models that have one.
    pub fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.model == DeviceModel::Hvac {
            self.simulator.drift_temperature(&mut self.state, rng);
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
