//! Field controls - display and input coercion at the control boundary
//!
//! Values at rest are dynamic JSON. A control turns them into plain display
//! text, and turns raw user input back into a value of the declared type.
//! `coerce` returning `None` means the update is refused and the store is
//! left untouched.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Number, Value};

use super::mapper::{select_control, ControlKind};
use crate::error::{ActionFormError, Result};
use crate::schema::{FieldRole, FormField, DATE_FORMAT};

/// Read-only placeholder for fields without a value
pub const NOT_PROVIDED: &str = "Not provided";

/// Shown instead of structured data a scalar control cannot display
pub const INVALID_VALUE: &str = "Invalid value";

const TRUTHY: &[&str] = &["true", "yes", "y", "on", "1", "x", "checked"];
const FALSY: &[&str] = &["false", "no", "n", "off", "0", "", "unchecked"];

/// A control as presented to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedControl {
    pub name: String,
    pub kind: ControlKind,
    pub display: String,
    pub enabled: bool,
    pub required: bool,
}

/// Control bound to one declared field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldControl {
    field: FormField,
    kind: ControlKind,
}

impl FieldControl {
    pub fn for_field(field: &FormField) -> Self {
        Self {
            kind: select_control(field.field_type, field.multiline),
            field: field.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn field(&self) -> &FormField {
        &self.field
    }

    pub fn kind(&self) -> &ControlKind {
        &self.kind
    }

    /// Input fields are never editable, whatever the host says
    pub fn is_enabled(&self, read_only: bool) -> bool {
        !read_only && self.field.role != FieldRole::Input
    }

    pub fn render(&self, value: Option<&Value>, read_only: bool) -> RenderedControl {
        let enabled = self.is_enabled(read_only);
        let display = match value {
            Some(v) if !is_blank(v) => display_value(&self.kind, v),
            _ if enabled => String::new(),
            _ => NOT_PROVIDED.to_string(),
        };
        RenderedControl {
            name: self.field.name.clone(),
            kind: self.kind.clone(),
            display,
            enabled,
            required: self.field.required,
        }
    }

    /// Convert raw input to a value of the declared type
    pub fn coerce(&self, input: &str) -> Option<Value> {
        coerce_with(&self.kind, input)
    }

    /// `coerce`, with a refusal turned into an error
    pub fn parse(&self, input: &str) -> Result<Value> {
        self.coerce(input).ok_or_else(|| ActionFormError::InvalidInput {
            name: self.field.name.clone(),
            input: input.to_string(),
        })
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn display_value(kind: &ControlKind, value: &Value) -> String {
    match (kind, value) {
        (ControlKind::List { item }, Value::Array(items)) => items
            .iter()
            .map(|v| display_value(item, v))
            .collect::<Vec<_>>()
            .join(", "),
        (ControlKind::Checkbox, Value::Bool(b)) => (if *b { "Yes" } else { "No" }).to_string(),
        // whole floats (4.0) read as integers; anything else is shown as stored
        (ControlKind::Numeric { integer: true }, Value::Number(n)) => match n.as_f64() {
            Some(f) if n.as_i64().is_none() && f.fract() == 0.0 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        (_, Value::String(s)) => s.clone(),
        (_, Value::Number(n)) => n.to_string(),
        (_, Value::Bool(b)) => b.to_string(),
        (_, Value::Null) => String::new(),
        (_, Value::Array(_) | Value::Object(_)) => INVALID_VALUE.to_string(),
    }
}

fn coerce_with(kind: &ControlKind, input: &str) -> Option<Value> {
    match kind {
        ControlKind::Text | ControlKind::MultilineText => Some(Value::String(input.to_string())),
        ControlKind::Checkbox => coerce_bool(input),
        ControlKind::Numeric { integer } => coerce_number(input, *integer),
        ControlKind::DatePicker => coerce_date(input),
        ControlKind::List { item } => {
            let items = input
                .split([',', '\n'])
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| coerce_with(item, part))
                .collect::<Option<Vec<_>>>()?;
            Some(Value::Array(items))
        }
    }
}

fn coerce_bool(input: &str) -> Option<Value> {
    let word = input.trim().to_lowercase();
    if TRUTHY.contains(&word.as_str()) {
        Some(Value::Bool(true))
    } else if FALSY.contains(&word.as_str()) {
        Some(Value::Bool(false))
    } else {
        None
    }
}

fn coerce_number(input: &str, integer: bool) -> Option<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(Value::Null);
    }
    let parsed: f64 = trimmed.parse().ok().filter(|f: &f64| f.is_finite())?;
    if integer {
        let rounded = parsed.round();
        if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
            return None;
        }
        Some(Value::from(rounded as i64))
    } else {
        Number::from_f64(parsed).map(Value::Number)
    }
}

fn coerce_date(input: &str) -> Option<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(Value::Null);
    }
    let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })?;
    Some(Value::String(date.format(DATE_FORMAT).to_string()))
}
