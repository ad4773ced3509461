//! Semantic validation of a declared action schema
//!
//! Runs after structural (JSON Schema) validation:
//! - field names are identifiers and unique across all sections
//! - the reserved host field name is not used
//! - at least one outcome is declared, outcome names are unique

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{ActionSchema, RESERVED_FIELD_NAME};
use crate::error::{ActionFormError, Result};

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Validate a single field or outcome name
pub fn validate_field_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ActionFormError::InvalidFieldName {
            name: name.to_string(),
            reason: "name cannot be empty".to_string(),
        });
    }
    if !FIELD_NAME_RE.is_match(name) {
        return Err(ActionFormError::InvalidFieldName {
            name: name.to_string(),
            reason: "must start with a letter or underscore and contain only letters, digits, underscores"
                .to_string(),
        });
    }
    if name == RESERVED_FIELD_NAME {
        return Err(ActionFormError::ReservedField {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Validate the whole schema, failing on the first problem
pub fn validate_schema(schema: &ActionSchema) -> Result<()> {
    let mut seen = HashSet::new();
    for field in schema.fields() {
        validate_field_name(&field.name)?;
        if !seen.insert(field.name.as_str()) {
            return Err(ActionFormError::DuplicateField {
                name: field.name.clone(),
            });
        }
    }

    if schema.outcomes().is_empty() {
        return Err(ActionFormError::NoOutcomes);
    }

    let mut outcomes = HashSet::new();
    for outcome in schema.outcomes() {
        if outcome.trim().is_empty() {
            return Err(ActionFormError::InvalidFieldName {
                name: outcome.clone(),
                reason: "outcome name cannot be empty".to_string(),
            });
        }
        if !outcomes.insert(outcome.as_str()) {
            return Err(ActionFormError::DuplicateField {
                name: outcome.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldRole, FieldType, FormField, ScalarType};

    fn text(name: &str, role: FieldRole) -> FormField {
        FormField::new(name, FieldType::scalar(ScalarType::Text), role)
    }

    #[test]
    fn accepts_identifiers() {
        assert!(validate_field_name("patientName").is_ok());
        assert!(validate_field_name("_internal2").is_ok());
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(matches!(
            validate_field_name("2fast"),
            Err(ActionFormError::InvalidFieldName { .. })
        ));
        assert!(matches!(
            validate_field_name("has space"),
            Err(ActionFormError::InvalidFieldName { .. })
        ));
        assert!(matches!(
            validate_field_name(""),
            Err(ActionFormError::InvalidFieldName { .. })
        ));
    }

    #[test]
    fn rejects_reserved_name() {
        let err = ActionSchema::new(vec![text("Id", FieldRole::Input)], vec!["Approve".into()])
            .unwrap_err();
        assert!(matches!(err, ActionFormError::ReservedField { .. }));
    }

    #[test]
    fn rejects_duplicates_across_sections() {
        let err = ActionSchema::new(
            vec![text("notes", FieldRole::Input), text("notes", FieldRole::Output)],
            vec!["Approve".into()],
        )
        .unwrap_err();
        assert!(matches!(err, ActionFormError::DuplicateField { name } if name == "notes"));
    }

    #[test]
    fn requires_an_outcome() {
        let err = ActionSchema::new(vec![text("notes", FieldRole::Output)], vec![]).unwrap_err();
        assert!(matches!(err, ActionFormError::NoOutcomes));
    }

    #[test]
    fn rejects_duplicate_outcomes() {
        let err = ActionSchema::new(vec![], vec!["Approve".into(), "Approve".into()]).unwrap_err();
        assert!(matches!(err, ActionFormError::DuplicateField { .. }));
    }
}
