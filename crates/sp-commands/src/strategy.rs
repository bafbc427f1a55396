//! Per-model command dispatch.
//!
//! The device registration's model number selects exactly one strategy.
//! There is no fallback: an unrecognized model is an error.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::catalog::CommandCatalog;
use crate::error::StrategyError;
use crate::hvac::HvacCommand;

/// Known device models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceModel {
    /// Thermostat using the fixed HVAC command shape.
    Hvac,
    /// Fan controller driving a bus of addressable fans.
    SimController,
    /// Stand-alone fan.
    SimFan,
}

impl DeviceModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceModel::Hvac => "test-model",
            DeviceModel::SimController => "sim-controller",
            DeviceModel::SimFan => "sim-fan",
        }
    }

    pub fn is_schema_driven(&self) -> bool {
        matches!(self, DeviceModel::SimController | DeviceModel::SimFan)
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceModel {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test-model" => Ok(DeviceModel::Hvac),
            "sim-controller" => Ok(DeviceModel::SimController),
            "sim-fan" => Ok(DeviceModel::SimFan),
            other => Err(StrategyError::UnknownModel(other.to_string())),
        }
    }
}

/// Flat hyphen-delimited command validated against the schema catalog.
#[derive(Debug, Clone)]
pub struct SchemaDrivenCommand<'a> {
    command: Value,
    catalog: &'a CommandCatalog,
}

impl<'a> SchemaDrivenCommand<'a> {
    pub fn new(command: Value, catalog: &'a CommandCatalog) -> Self {
        Self { command, catalog }
    }

    pub fn validate(&self) -> bool {
        match self.catalog.validator().check(&self.command) {
            Ok(()) => true,
            Err(rejection) => {
                tracing::info!(
                    command = %self.command,
                    reason = %rejection,
                    "command is invalid"
                );
                false
            }
        }
    }

    /// The flat command restricted to `command`, `value` and `address`.
    pub fn details(&self) -> Value {
        let mut details = Map::new();
        for key in ["command", "value", "address"] {
            if let Some(v) = self.command.get(key).filter(|v| !v.is_null()) {
                details.insert(key.to_string(), v.clone());
            }
        }
        Value::Object(details)
    }

    pub fn shadow_details(&self) -> Result<Value, StrategyError> {
        Ok(self.catalog.transform().transform(&self.command)?)
    }
}

/// Capability set shared by all model-specific encoders.
#[derive(Debug, Clone)]
pub enum CommandStrategy<'a> {
    Hvac(HvacCommand),
    SchemaDriven(SchemaDrivenCommand<'a>),
}

impl<'a> CommandStrategy<'a> {
    /// Pick the strategy for `model_number`, failing on unknown models.
    pub fn select(
        model_number: &str,
        raw: Value,
        catalog: &'a CommandCatalog,
    ) -> Result<Self, StrategyError> {
        let model: DeviceModel = model_number.parse()?;
        Ok(Self::for_model(model, raw, catalog))
    }

    pub fn for_model(model: DeviceModel, raw: Value, catalog: &'a CommandCatalog) -> Self {
        match model {
            DeviceModel::Hvac => CommandStrategy::Hvac(HvacCommand::new(raw)),
            DeviceModel::SimController | DeviceModel::SimFan => {
                CommandStrategy::SchemaDriven(SchemaDrivenCommand::new(raw, catalog))
            }
        }
    }

    /// Validate the command. May normalize fields in place.
    pub fn validate(&mut self) -> bool {
        match self {
            CommandStrategy::Hvac(cmd) => cmd.validate(),
            CommandStrategy::SchemaDriven(cmd) => cmd.validate(),
        }
    }

    /// Payload persisted with the command record.
    pub fn details(&self) -> Value {
        match self {
            CommandStrategy::Hvac(cmd) => cmd.details(),
            CommandStrategy::SchemaDriven(cmd) => cmd.details(),
        }
    }

    /// Desired-state patch for the device twin.
    pub fn shadow_details(&self) -> Result<Value, StrategyError> {
        match self {
            CommandStrategy::Hvac(cmd) => Ok(cmd.shadow_details()),
            CommandStrategy::SchemaDriven(cmd) => cmd.shadow_details(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_numbers_parse() {
        assert_eq!("test-model".parse::<DeviceModel>(), Ok(DeviceModel::Hvac));
        assert_eq!(
            "sim-controller".parse::<DeviceModel>(),
            Ok(DeviceModel::SimController)
        );
        assert_eq!("sim-fan".parse::<DeviceModel>(), Ok(DeviceModel::SimFan));
        assert!(DeviceModel::SimFan.is_schema_driven());
        assert!(!DeviceModel::Hvac.is_schema_driven());
    }

    #[test]
    fn unknown_model_has_no_fallback() {
        let catalog = CommandCatalog::builtin().unwrap();
        let err = CommandStrategy::select("toaster-9000", json!({}), &catalog).unwrap_err();
        assert_eq!(err, StrategyError::UnknownModel("toaster-9000".into()));
    }

    #[test]
    fn hvac_dispatch() {
        let catalog = CommandCatalog::builtin().unwrap();
        let raw = json!({
            "commandDetails": {"command": "set-temp", "value": 70},
            "shadowDetails": {"powerStatus": "AC", "actualTemperature": 75, "targetTemperature": 70}
        });
        let mut strategy = CommandStrategy::select("test-model", raw, &catalog).unwrap();
        assert!(matches!(strategy, CommandStrategy::Hvac(_)));
        assert!(strategy.validate());
        assert_eq!(
            strategy.shadow_details().unwrap(),
            json!({"powerStatus": "AC", "actualTemperature": 75, "targetTemperature": 70})
        );
    }

    #[test]
    fn schema_driven_dispatch() {
        let catalog = CommandCatalog::builtin().unwrap();
        let raw = json!({
            "command": "set-fan-commandedSpeedPercent",
            "value": 42,
            "address": 5,
            "clientTag": "ignored"
        });
        let mut strategy = CommandStrategy::select("sim-controller", raw, &catalog).unwrap();
        assert!(strategy.validate());
        assert_eq!(
            strategy.details(),
            json!({"command": "set-fan-commandedSpeedPercent", "value": 42, "address": 5})
        );
        assert_eq!(
            strategy.shadow_details().unwrap(),
            json!({"fan": {"5": {"commandedSpeedPercent": 42}}})
        );
    }

    #[test]
    fn schema_driven_rejects_invalid_address() {
        let catalog = CommandCatalog::builtin().unwrap();
        let raw = json!({"command": "set-fan-power", "value": true, "address": 0});
        let mut strategy = CommandStrategy::select("sim-fan", raw, &catalog).unwrap();
        assert!(!strategy.validate());
    }

    #[test]
    fn details_omit_absent_fields() {
        let catalog = CommandCatalog::builtin().unwrap();
        let strategy = CommandStrategy::select(
            "sim-controller",
            json!({"command": "set-fan-resetFaults", "address": 3}),
            &catalog,
        )
        .unwrap();
        assert_eq!(
            strategy.details(),
            json!({"command": "set-fan-resetFaults", "address": 3})
        );
    }
}
