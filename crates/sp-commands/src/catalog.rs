use crate::error::SchemaError;
use crate::schema::CommandSchema;
use crate::transform::ShadowTransform;
use crate::validator::CommandValidator;

/// Validator and transform shared by every schema-driven strategy.
///
/// Built once at startup; strategies borrow it per request.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    validator: CommandValidator,
    transform: ShadowTransform,
}

impl CommandCatalog {
    pub fn new(schema: CommandSchema, transform: ShadowTransform) -> Self {
        Self {
            validator: CommandValidator::new(schema),
            transform,
        }
    }

    /// Bundled schema with the default addressable entity types.
    pub fn builtin() -> Result<Self, SchemaError> {
        Ok(Self::new(CommandSchema::builtin()?, ShadowTransform::default()))
    }

    pub fn validator(&self) -> &CommandValidator {
        &self.validator
    }

    pub fn transform(&self) -> &ShadowTransform {
        &self.transform
    }
}
