//! Validation of flat commands against the schema.

use std::fmt;

use serde_json::Value;

use crate::schema::{CommandSchema, TypeTag};

/// Why a command was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No `command` string on the input.
    MissingCommand,
    /// The command path does not resolve to a leaf.
    UnknownCommand(String),
    /// A field named by the leaf is missing or has the wrong type.
    InvalidField { field: String, expected: TypeTag },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingCommand => f.write_str("missing command"),
            Rejection::UnknownCommand(name) => write!(f, "unknown command '{name}'"),
            Rejection::InvalidField { field, expected } => {
                write!(f, "field '{field}' must be a {expected}")
            }
        }
    }
}

/// Checks flat commands (`{command, value?, address?}`) against a schema.
///
/// Fields the resolved leaf does not name are ignored.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    schema: CommandSchema,
}

impl CommandValidator {
    pub fn new(schema: CommandSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &CommandSchema {
        &self.schema
    }

    pub fn is_valid(&self, command: &Value) -> bool {
        self.check(command).is_ok()
    }

    /// Validate and report the first failing rule.
    pub fn check(&self, command: &Value) -> Result<(), Rejection> {
        let Some(name) = command.get("command").and_then(Value::as_str) else {
            return Err(Rejection::MissingCommand);
        };

        let rules = self
            .schema
            .resolve(name)
            .ok_or_else(|| Rejection::UnknownCommand(name.to_string()))?;

        for (field, tag) in rules {
            if !tag.accepts(command.get(field)) {
                return Err(Rejection::InvalidField {
                    field: field.clone(),
                    expected: *tag,
                });
            }
        }
        Ok(())
    }
}
