//! Hierarchical command schema.
//!
//! Commands are hyphen-separated paths into a tree of branches. Each path
//! ends at a leaf mapping field names to type tags:
//!
//! ```text
//! set-fan-power  ->  { value: boolean, address: modbusAddress }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use serde_yaml::Value as Yaml;

use crate::error::SchemaError;

/// Schema bundled with the crate.
pub const BUILTIN_SCHEMA: &str = include_str!("../schema/command.schema.yml");

/// Root key reserved for documentation.
const META_KEY: &str = "meta";

/// Lowest valid Modbus slave address.
pub const MODBUS_ADDRESS_MIN: i64 = 1;
/// Highest valid Modbus slave address.
pub const MODBUS_ADDRESS_MAX: i64 = 247;

/// Type a command field must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    String,
    /// A JSON number or a string holding a finite decimal number.
    Number,
    Boolean,
    /// An integer in `[1, 247]`.
    ModbusAddress,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::ModbusAddress => "modbusAddress",
        }
    }

    /// Whether `value` satisfies this type. A missing field never does.
    pub fn accepts(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            TypeTag::String => value.is_string(),
            TypeTag::Number => as_number(value).is_some(),
            TypeTag::Boolean => value.is_boolean(),
            TypeTag::ModbusAddress => as_integer(value)
                .is_some_and(|n| (MODBUS_ADDRESS_MIN..=MODBUS_ADDRESS_MAX).contains(&n)),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(TypeTag::String),
            "number" => Ok(TypeTag::Number),
            "boolean" => Ok(TypeTag::Boolean),
            "modbusAddress" => Ok(TypeTag::ModbusAddress),
            other => Err(other.to_string()),
        }
    }
}

/// Numeric value of a JSON number or numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Integral value of a JSON number (`5` or `5.0`).
pub fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Field name to type tag for one command.
pub type FieldRules = BTreeMap<String, TypeTag>;

/// A node in the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Branch(BTreeMap<String, SchemaNode>),
    Leaf(FieldRules),
}

/// Immutable command schema, loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSchema {
    root: BTreeMap<String, SchemaNode>,
}

impl CommandSchema {
    /// Load the schema bundled with the crate.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_yaml_str(BUILTIN_SCHEMA)
    }

    /// Parse a schema document.
    ///
    /// A mapping whose values are all strings (or an empty mapping) is a
    /// leaf; a mapping whose values are all mappings is a branch. The root
    /// `meta` key is ignored.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        let doc: Yaml = serde_yaml::from_str(yaml)?;
        let Yaml::Mapping(map) = doc else {
            return Err(SchemaError::Malformed {
                path: String::new(),
                reason: "root must be a mapping".into(),
            });
        };

        let mut root = BTreeMap::new();
        for (key, value) in map {
            let key = mapping_key(&key, "")?;
            if key == META_KEY {
                continue;
            }
            let node = parse_node(&key, value)?;
            root.insert(key, node);
        }
        Ok(Self { root })
    }

    /// Field rules for a hyphen-delimited command, or `None` when any
    /// segment is empty or unknown or the path ends on a branch.
    pub fn resolve(&self, command: &str) -> Option<&FieldRules> {
        let mut segments = command.split('-');
        let first = segments.next().filter(|s| !s.is_empty())?;
        let mut node = self.root.get(first)?;

        for segment in segments {
            if segment.is_empty() {
                return None;
            }
            match node {
                SchemaNode::Branch(children) => node = children.get(segment)?,
                SchemaNode::Leaf(_) => return None,
            }
        }

        match node {
            SchemaNode::Leaf(rules) => Some(rules),
            SchemaNode::Branch(_) => None,
        }
    }

    /// Every command path that resolves to a leaf, sorted.
    pub fn commands(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (key, node) in &self.root {
            collect_commands(key, node, &mut out);
        }
        out
    }
}

fn collect_commands(prefix: &str, node: &SchemaNode, out: &mut Vec<String>) {
    match node {
        SchemaNode::Leaf(_) => out.push(prefix.to_string()),
        SchemaNode::Branch(children) => {
            for (key, child) in children {
                collect_commands(&format!("{prefix}-{key}"), child, out);
            }
        }
    }
}

fn mapping_key(key: &Yaml, parent: &str) -> Result<String, SchemaError> {
    match key {
        Yaml::String(s) if !s.is_empty() && !s.contains('-') => Ok(s.clone()),
        other => Err(SchemaError::Malformed {
            path: parent.to_string(),
            reason: format!("invalid key {other:?}"),
        }),
    }
}

fn parse_node(path: &str, value: Yaml) -> Result<SchemaNode, SchemaError> {
    let Yaml::Mapping(map) = value else {
        return Err(SchemaError::Malformed {
            path: path.to_string(),
            reason: "expected a mapping".into(),
        });
    };

    if map.values().all(|v| matches!(v, Yaml::String(_))) {
        let mut rules = FieldRules::new();
        for (key, value) in map {
            let field = mapping_key(&key, path)?;
            let Yaml::String(tag) = value else {
                continue;
            };
            let tag = tag.parse::<TypeTag>().map_err(|tag| SchemaError::UnknownTypeTag {
                path: format!("{path}.{field}"),
                tag,
            })?;
            rules.insert(field, tag);
        }
        return Ok(SchemaNode::Leaf(rules));
    }

    if map.values().all(|v| matches!(v, Yaml::Mapping(_))) {
        let mut children = BTreeMap::new();
        for (key, value) in map {
            let segment = mapping_key(&key, path)?;
            let child = parse_node(&format!("{path}-{segment}"), value)?;
            children.insert(segment, child);
        }
        return Ok(SchemaNode::Branch(children));
    }

    Err(SchemaError::Malformed {
        path: path.to_string(),
        reason: "mixes field rules and sub-commands".into(),
    })
}
