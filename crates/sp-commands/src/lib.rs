//! Command encoding for SmartProduct devices.
//!
//! - `CommandSchema` / `CommandValidator` check flat hyphen-delimited
//!   commands against a hierarchical rule tree
//! - `ShadowTransform` folds a flat command into a nested desired-state patch
//! - `CommandStrategy` dispatches per device model (fixed-schema HVAC or
//!   schema-driven fan controllers)

pub mod catalog;
pub mod error;
pub mod hvac;
pub mod schema;
pub mod strategy;
pub mod transform;
pub mod validator;

// Re-exports for convenience.
pub use catalog::CommandCatalog;
pub use error::{SchemaError, StrategyError, TransformError};
pub use hvac::HvacCommand;
pub use schema::{CommandSchema, FieldRules, TypeTag};
pub use strategy::{CommandStrategy, DeviceModel, SchemaDrivenCommand};
pub use transform::ShadowTransform;
pub use validator::{CommandValidator, Rejection};
