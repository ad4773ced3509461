//! Structural validation of action schema documents
//!
//! Validates the raw document against the embedded JSON Schema before
//! serde parsing, so authors get path-level errors instead of a single
//! serde message.

use jsonschema::Validator;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::ActionFormError;

/// Embedded schema JSON (compiled at build time)
const SCHEMA_JSON: &str = include_str!("../../schemas/action-schema.schema.json");

/// Global schema validator instance (lazy initialization)
static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();

/// Schema validation error details
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    /// JSON pointer path to the error (e.g., "/outputs/properties/score")
    pub path: String,
    /// Human-readable error message
    pub message: String,
}

impl SchemaError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validates action schema documents against the embedded JSON Schema
pub struct StructureValidator {
    validator: &'static Validator,
}

impl StructureValidator {
    /// Uses a cached global validator
    pub fn new() -> Result<Self, ActionFormError> {
        let validator_result = VALIDATOR.get_or_init(|| {
            let schema: Value = serde_json::from_str(SCHEMA_JSON)
                .map_err(|e| format!("Failed to parse embedded schema: {}", e))?;
            Validator::new(&schema).map_err(|e| format!("Failed to compile schema: {}", e))
        });

        match validator_result {
            Ok(validator) => Ok(Self { validator }),
            Err(e) => Err(ActionFormError::SchemaParse { details: e.clone() }),
        }
    }

    /// Validate a document already parsed to a JSON value
    pub fn validate_value(&self, value: &Value) -> Result<(), ActionFormError> {
        let errors: Vec<SchemaError> = self
            .validator
            .iter_errors(value)
            .map(|e| SchemaError::new(e.instance_path.to_string(), e.to_string()))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ActionFormError::SchemaInvalid { errors })
        }
    }
}
