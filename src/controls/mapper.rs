//! Schema type → control kind
//!
//! The declared type (plus the multiline hint for text) decides which
//! control edits a field. Lists wrap the kind of their items.

use serde::Serialize;

use crate::schema::{FieldType, ScalarType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlKind {
    Checkbox,
    MultilineText,
    Text,
    Numeric { integer: bool },
    DatePicker,
    List { item: Box<ControlKind> },
}

impl ControlKind {
    /// Short label for the text preview
    pub fn label(&self) -> String {
        match self {
            ControlKind::Checkbox => "checkbox".to_string(),
            ControlKind::MultilineText => "textarea".to_string(),
            ControlKind::Text => "text".to_string(),
            ControlKind::Numeric { integer: true } => "integer".to_string(),
            ControlKind::Numeric { integer: false } => "number".to_string(),
            ControlKind::DatePicker => "date".to_string(),
            ControlKind::List { item } => format!("list<{}>", item.label()),
        }
    }
}

/// Pick the control for a declared type
pub fn select_control(field_type: FieldType, multiline: bool) -> ControlKind {
    let item = match field_type.scalar {
        ScalarType::Boolean => ControlKind::Checkbox,
        // multiline list items make no sense; items are always single-line
        ScalarType::Text if multiline && !field_type.list => ControlKind::MultilineText,
        ScalarType::Text => ControlKind::Text,
        ScalarType::Integer => ControlKind::Numeric { integer: true },
        ScalarType::Float => ControlKind::Numeric { integer: false },
        ScalarType::Date => ControlKind::DatePicker,
    };

    if field_type.list {
        ControlKind::List {
            item: Box::new(item),
        }
    } else {
        item
    }
}
