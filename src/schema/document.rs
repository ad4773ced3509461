//! Action schema document parsing
//!
//! The document is JSON (YAML is accepted too, it is a superset):
//!
//! ```json
//! {
//!   "inputs":  { "type": "object", "properties": { "patientName": { "type": "string" } } },
//!   "outputs": { "type": "object", "properties": { "comments": { "type": "string", "multiline": true } },
//!                "required": ["comments"] },
//!   "inOuts":  { "type": "object", "properties": {} },
//!   "outcomes":{ "type": "object", "properties": { "Approve": { "type": "string" } } }
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::structure::StructureValidator;
use super::types::{ActionSchema, FieldRole, FieldType, FormField, ScalarType};
use crate::error::{ActionFormError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaDoc {
    #[serde(default)]
    inputs: SectionDoc,
    #[serde(default)]
    outputs: SectionDoc,
    #[serde(default)]
    in_outs: SectionDoc,
    outcomes: OutcomeDoc,
}

#[derive(Debug, Default, Deserialize)]
struct SectionDoc {
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    required: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OutcomeDoc {
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct PropertyDoc {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    items: Option<Box<PropertyDoc>>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    multiline: bool,
}

impl ActionSchema {
    /// Parse and validate a schema document (JSON or YAML text)
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text).map_err(|e| ActionFormError::SchemaParse {
            details: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Load a schema document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Validate and build a schema from an already-parsed document
    pub fn from_value(value: Value) -> Result<Self> {
        StructureValidator::new()?.validate_value(&value)?;

        let doc: SchemaDoc =
            serde_json::from_value(value).map_err(|e| ActionFormError::SchemaParse {
                details: e.to_string(),
            })?;

        let mut fields = Vec::new();
        for (role, section) in [
            (FieldRole::Input, doc.inputs),
            (FieldRole::Output, doc.outputs),
            (FieldRole::InOut, doc.in_outs),
        ] {
            fields.extend(section_fields(role, section)?);
        }
        let outcomes = doc.outcomes.properties.keys().cloned().collect();

        ActionSchema::new(fields, outcomes)
    }
}

fn section_fields(role: FieldRole, section: SectionDoc) -> Result<Vec<FormField>> {
    for name in &section.required {
        if !section.properties.contains_key(name) {
            return Err(ActionFormError::UnknownField {
                name: format!("{}.{}", role.section(), name),
            });
        }
    }

    section
        .properties
        .into_iter()
        .map(|(name, raw)| {
            let prop: PropertyDoc =
                serde_json::from_value(raw).map_err(|e| ActionFormError::SchemaParse {
                    details: format!("{}.{}: {}", role.section(), name, e),
                })?;
            let field_type = property_type(&name, &prop)?;
            Ok(FormField {
                required: section.required.contains(&name),
                field_type,
                role,
                multiline: prop.multiline,
                description: prop.description,
                name,
            })
        })
        .collect()
}

fn property_type(name: &str, prop: &PropertyDoc) -> Result<FieldType> {
    if prop.kind == "array" {
        let item = prop
            .items
            .as_deref()
            .ok_or_else(|| ActionFormError::UnsupportedType {
                field: name.to_string(),
                declared: "array without items".to_string(),
            })?;
        if item.kind == "array" {
            return Err(ActionFormError::UnsupportedType {
                field: name.to_string(),
                declared: "nested array".to_string(),
            });
        }
        return Ok(FieldType::list_of(scalar_type(name, &item.kind, item.format.as_deref())?));
    }
    Ok(FieldType::scalar(scalar_type(
        name,
        &prop.kind,
        prop.format.as_deref(),
    )?))
}

fn scalar_type(name: &str, kind: &str, format: Option<&str>) -> Result<ScalarType> {
    match (kind, format) {
        ("string", Some("date")) => Ok(ScalarType::Date),
        ("string", _) => Ok(ScalarType::Text),
        ("integer", _) => Ok(ScalarType::Integer),
        ("number", _) => Ok(ScalarType::Float),
        ("boolean", _) => Ok(ScalarType::Boolean),
        (other, _) => Err(ActionFormError::UnsupportedType {
            field: name.to_string(),
            declared: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REVIEW_SCHEMA: &str = r#"{
        "inputs": {
            "type": "object",
            "properties": {
                "patientName": { "type": "string", "description": "Patient" },
                "admittedOn": { "type": "string", "format": "date" }
            },
            "required": ["patientName"]
        },
        "outputs": {
            "type": "object",
            "properties": {
                "reviewerComments": { "type": "string", "multiline": true },
                "approvedDays": { "type": "integer" }
            },
            "required": ["reviewerComments"]
        },
        "inOuts": {
            "type": "object",
            "properties": {
                "urgent": { "type": "boolean" },
                "codes": { "type": "array", "items": { "type": "string" } }
            }
        },
        "outcomes": {
            "type": "object",
            "properties": {
                "Approve": { "type": "string" },
                "Reject": { "type": "string" }
            }
        }
    }"#;

    #[test]
    fn parses_all_sections_in_order() {
        let schema = ActionSchema::parse(REVIEW_SCHEMA).unwrap();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["patientName", "admittedOn", "reviewerComments", "approvedDays", "urgent", "codes"]
        );
        assert_eq!(schema.outcomes(), &["Approve".to_string(), "Reject".to_string()]);
    }

    #[test]
    fn maps_declared_types_and_roles() {
        let schema = ActionSchema::parse(REVIEW_SCHEMA).unwrap();

        let admitted = schema.field("admittedOn").unwrap();
        assert_eq!(admitted.field_type, FieldType::scalar(ScalarType::Date));
        assert_eq!(admitted.role, FieldRole::Input);

        let comments = schema.field("reviewerComments").unwrap();
        assert!(comments.multiline);
        assert!(comments.required);
        assert_eq!(comments.role, FieldRole::Output);

        let codes = schema.field("codes").unwrap();
        assert_eq!(codes.field_type, FieldType::list_of(ScalarType::Text));
        assert_eq!(codes.role, FieldRole::InOut);
    }

    #[test]
    fn accepts_yaml_documents() {
        let yaml = r#"
outputs:
  properties:
    score: { type: number }
outcomes:
  properties:
    Done: { type: string }
"#;
        let schema = ActionSchema::parse(yaml).unwrap();
        assert_eq!(
            schema.field("score").unwrap().field_type,
            FieldType::scalar(ScalarType::Float)
        );
    }

    #[test]
    fn required_must_name_a_declared_property() {
        let doc = r#"{
            "outputs": { "properties": { "a": { "type": "string" } }, "required": ["b"] },
            "outcomes": { "properties": { "Done": { "type": "string" } } }
        }"#;
        let err = ActionSchema::parse(doc).unwrap_err();
        assert!(matches!(err, ActionFormError::UnknownField { name } if name == "outputs.b"));
    }

    #[test]
    fn empty_outcomes_fail_structural_validation() {
        let doc = r#"{ "outcomes": { "properties": {} } }"#;
        let err = ActionSchema::parse(doc).unwrap_err();
        assert!(matches!(err, ActionFormError::SchemaInvalid { .. }));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = ActionSchema::parse("{ not json").unwrap_err();
        assert_eq!(err.code(), "AF-001");
    }
}
