//! Field and form types built from the declared action schema

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Snapshot;

/// Field name reserved for host-internal bookkeeping
pub const RESERVED_FIELD_NAME: &str = "Id";

/// Calendar date format for date-only fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Scalar part of a declared field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
}

impl ScalarType {
    /// Check a single (non-list) value against this type
    ///
    /// `Null` is accepted everywhere: it is the explicit "no value".
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ScalarType::Text, Value::String(_)) => true,
            (ScalarType::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (ScalarType::Float, Value::Number(_)) => true,
            (ScalarType::Boolean, Value::Bool(_)) => true,
            (ScalarType::Date, Value::String(s)) => NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok(),
            _ => false,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Text => "text",
            ScalarType::Integer => "integer",
            ScalarType::Float => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Date => "date",
        };
        f.write_str(name)
    }
}

/// Declared field type: a scalar, optionally "list of"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldType {
    pub scalar: ScalarType,
    #[serde(default)]
    pub list: bool,
}

impl FieldType {
    pub const fn scalar(scalar: ScalarType) -> Self {
        Self {
            scalar,
            list: false,
        }
    }

    pub const fn list_of(scalar: ScalarType) -> Self {
        Self { scalar, list: true }
    }

    /// Validate a value at rest against the declared type
    pub fn accepts(&self, value: &Value) -> bool {
        if !self.list {
            return self.scalar.accepts(value);
        }
        match value {
            Value::Null => true,
            Value::Array(items) => items
                .iter()
                .all(|item| !item.is_null() && self.scalar.accepts(item)),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list {
            write!(f, "list of {}", self.scalar)
        } else {
            write!(f, "{}", self.scalar)
        }
    }
}

/// Who provides a field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldRole {
    /// Host-provided, never user-editable
    Input,
    /// User-provided, sent back to the host
    Output,
    /// Host-provided default, user-editable
    InOut,
}

impl FieldRole {
    pub fn is_editable(&self) -> bool {
        !matches!(self, FieldRole::Input)
    }

    /// Schema section that declares fields with this role
    pub fn section(&self) -> &'static str {
        match self {
            FieldRole::Input => "inputs",
            FieldRole::Output => "outputs",
            FieldRole::InOut => "inOuts",
        }
    }
}

/// A named, typed slot in the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub role: FieldRole,
    /// Rendering hint for text fields
    #[serde(default)]
    pub multiline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FormField {
    pub fn new(name: impl Into<String>, field_type: FieldType, role: FieldRole) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            role,
            multiline: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }
}

/// Validated declared schema: fields plus the finite set of outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSchema {
    fields: Vec<FormField>,
    outcomes: Vec<String>,
}

impl ActionSchema {
    /// Build a schema from parts (runs semantic validation)
    pub fn new(fields: Vec<FormField>, outcomes: Vec<String>) -> crate::error::Result<Self> {
        let schema = Self { fields, outcomes };
        super::validate::validate_schema(&schema)?;
        Ok(schema)
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields_with_role(&self, role: FieldRole) -> impl Iterator<Item = &FormField> {
        self.fields.iter().filter(move |f| f.role == role)
    }

    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    pub fn has_outcome(&self, outcome: &str) -> bool {
        self.outcomes.iter().any(|o| o == outcome)
    }

    /// Snapshot with every declared field set to "no value"
    pub fn empty_snapshot(&self) -> Snapshot {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), Value::Null))
            .collect()
    }

    /// Required user-editable fields that have no value in `snapshot`
    ///
    /// Input fields are the host's responsibility and are not checked.
    pub fn missing_required(&self, snapshot: &Snapshot) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required && f.role.is_editable())
            .filter(|f| match snapshot.get(&f.name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(Value::Array(items)) => items.is_empty(),
                Some(_) => false,
            })
            .map(|f| f.name.clone())
            .collect()
    }
}
