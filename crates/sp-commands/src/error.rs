//! Error types for schema loading, transformation and strategy dispatch.

use thiserror::Error;

/// Errors raised while loading a command schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unknown type tag '{tag}' at '{path}'")]
    UnknownTypeTag { path: String, tag: String },

    #[error("malformed schema at '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

/// Errors raised while folding a command into a shadow patch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("expected command argument")]
    MissingCommand,

    #[error("segment '{segment}' requires an integer address")]
    MissingAddress { segment: String },
}

/// Errors raised by strategy dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("unknown model number '{0}', no commands associated with model")]
    UnknownModel(String),

    #[error(transparent)]
    Transform(#[from] TransformError),
}
