//! Schema Module - the declared form contract
//!
//! Key types:
//! - `ActionSchema`: validated fields + outcomes
//! - `FormField`, `FieldType`, `ScalarType`, `FieldRole`: field model
//! - `StructureValidator`: JSON Schema check of raw documents

mod document;
mod structure;
mod types;
pub mod validate;

pub use structure::{SchemaError, StructureValidator};
pub use types::{
    ActionSchema, FieldRole, FieldType, FormField, ScalarType, DATE_FORMAT, RESERVED_FIELD_NAME,
};
pub use validate::validate_field_name;
