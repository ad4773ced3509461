//! Error types with error codes and fix suggestions
//!
//! Error code ranges:
//! - AF-000-009: Declared schema errors
//! - AF-010-019: Form state errors
//! - AF-020-029: Host / service client errors
//! - AF-030-039: Configuration errors
//! - AF-090-099: IO / serialization errors
//!
//! Host-absent failures are expected in preview mode and never reach the
//! caller as an `ActionFormError`; the bridge swallows them.

use thiserror::Error;

use crate::schema::SchemaError;

pub type Result<T> = std::result::Result<T, ActionFormError>;

/// Format schema validation errors for display
fn format_schema_errors(errors: &[SchemaError]) -> String {
    if errors.is_empty() {
        return "no errors".to_string();
    }
    if errors.len() == 1 {
        return errors[0].message.clone();
    }
    format!(
        "{} errors: {}",
        errors.len(),
        errors
            .iter()
            .map(|e| format!("[{}] {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    )
}

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum ActionFormError {
    // ═══════════════════════════════════════════
    // SCHEMA ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[AF-001] Failed to parse action schema: {details}")]
    SchemaParse { details: String },

    #[error("[AF-002] Action schema is invalid: {}", format_schema_errors(.errors))]
    SchemaInvalid { errors: Vec<SchemaError> },

    #[error("[AF-003] Duplicate field name '{name}'")]
    DuplicateField { name: String },

    #[error("[AF-004] Field name '{name}' is reserved")]
    ReservedField { name: String },

    #[error("[AF-005] Invalid field name '{name}': {reason}")]
    InvalidFieldName { name: String, reason: String },

    #[error("[AF-006] Action schema declares no outcomes")]
    NoOutcomes,

    #[error("[AF-007] Unsupported type '{declared}' for field '{field}'")]
    UnsupportedType { field: String, declared: String },

    // ═══════════════════════════════════════════
    // FORM STATE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[AF-010] Unknown field '{name}'")]
    UnknownField { name: String },

    #[error("[AF-011] Value for '{name}' does not match declared type {expected}: {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("[AF-012] Unknown outcome '{outcome}' (declared: {declared})")]
    UnknownOutcome { outcome: String, declared: String },

    #[error("[AF-013] Required fields are missing: {}", .fields.join(", "))]
    MissingRequired { fields: Vec<String> },

    #[error("[AF-014] Snapshot must be a JSON object, got {actual}")]
    SnapshotNotObject { actual: String },

    #[error("[AF-015] Input '{input}' cannot be converted for field '{name}'")]
    InvalidInput { name: String, input: String },

    // ═══════════════════════════════════════════
    // HOST / SERVICE ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[AF-020] Host is not available: {reason}")]
    HostUnavailable { reason: String },

    #[error("[AF-021] Host call '{call}' failed: {reason}")]
    HostCall { call: String, reason: String },

    #[error("[AF-022] Invalid service base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("[AF-023] Service request failed: {0}")]
    Service(#[from] reqwest::Error),

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[AF-030] Configuration error: {reason}")]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // IO / SERDE ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[AF-093] IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("[AF-094] JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("[AF-095] YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl ActionFormError {
    /// Error code (e.g. "AF-010"), for log fields and tests
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaParse { .. } => "AF-001",
            Self::SchemaInvalid { .. } => "AF-002",
            Self::DuplicateField { .. } => "AF-003",
            Self::ReservedField { .. } => "AF-004",
            Self::InvalidFieldName { .. } => "AF-005",
            Self::NoOutcomes => "AF-006",
            Self::UnsupportedType { .. } => "AF-007",
            Self::UnknownField { .. } => "AF-010",
            Self::TypeMismatch { .. } => "AF-011",
            Self::UnknownOutcome { .. } => "AF-012",
            Self::MissingRequired { .. } => "AF-013",
            Self::SnapshotNotObject { .. } => "AF-014",
            Self::InvalidInput { .. } => "AF-015",
            Self::HostUnavailable { .. } => "AF-020",
            Self::HostCall { .. } => "AF-021",
            Self::InvalidBaseUrl { .. } => "AF-022",
            Self::Service(_) => "AF-023",
            Self::ConfigError { .. } => "AF-030",
            Self::IoError(_) => "AF-093",
            Self::JsonError(_) => "AF-094",
            Self::YamlError(_) => "AF-095",
        }
    }

    /// Whether this error means "no host on the other end"
    pub fn is_host_failure(&self) -> bool {
        matches!(self, Self::HostUnavailable { .. } | Self::HostCall { .. })
    }
}

impl FixSuggestion for ActionFormError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            Self::SchemaParse { .. } => Some("Check the schema is valid JSON or YAML"),
            Self::SchemaInvalid { .. } => {
                Some("Each section needs type: object and a properties map")
            }
            Self::DuplicateField { .. } => {
                Some("Field names must be unique across inputs, outputs and inOuts")
            }
            Self::ReservedField { .. } => Some("Rename the field; 'Id' is used by the host"),
            Self::InvalidFieldName { .. } => {
                Some("Use letters, digits and underscores, starting with a letter")
            }
            Self::NoOutcomes => Some("Declare at least one outcome, e.g. Approve"),
            Self::UnsupportedType { .. } => {
                Some("Use string, integer, number, boolean or array of those")
            }
            Self::UnknownField { .. } => Some("Declare the field in the action schema"),
            Self::TypeMismatch { .. } => Some("Convert the value through the field's control"),
            Self::UnknownOutcome { .. } => Some("Use one of the outcomes declared in the schema"),
            Self::MissingRequired { .. } => Some("Fill in all required fields before completing"),
            Self::SnapshotNotObject { .. } => Some("Provide data as a JSON object"),
            Self::InvalidInput { .. } => Some("Enter a value matching the field type"),
            Self::HostUnavailable { .. } | Self::HostCall { .. } => None,
            Self::InvalidBaseUrl { .. } => Some("baseUrl must be an absolute http(s) URL"),
            Self::Service(_) => Some("Check the service URL and that the token is still valid"),
            Self::ConfigError { .. } => Some("Check ~/.config/action-form/config.toml syntax"),
            Self::IoError(_) => Some("Check file path and permissions"),
            Self::JsonError(_) => Some("Check JSON syntax"),
            Self::YamlError(_) => Some("Check YAML syntax: indentation and quoting"),
        }
    }
}
