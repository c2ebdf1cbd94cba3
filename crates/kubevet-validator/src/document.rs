//! Document routing
//!
//! One YAML/JSON document in, exactly one result out. `List` kinds are
//! special-cased at the root: items validate independently and their errors
//! aggregate with `items[i]:` prefixes; nested lists are rejected the way
//! the apiserver rejects them. CRD documents bypass the structural pipeline
//! entirely (their published schema is self-recursive) and run the
//! hand-written strategy instead.

use serde_json::Value;

use crate::crd_strategy;
use crate::error::ValidationError;
use crate::field::{FieldError, FieldPath};
use crate::validator::Validator;
use kubevet_openapi::yaml::{is_empty_yaml_document, split_yaml_documents};
use kubevet_schema::crd::{CRD_GROUP, CRD_KIND};
use kubevet_schema::GroupVersion;

/// Validate every document in a file's contents. YAML files are split on
/// document boundaries; anything else is a single document. The result has
/// one entry per document; `None` is success (including empty documents).
pub fn validate_file_contents(
    validator: &Validator,
    contents: &[u8],
    is_yaml: bool,
) -> Vec<Option<ValidationError>> {
    if !is_yaml {
        return vec![validate_document(validator, contents).err()];
    }

    split_yaml_documents(contents)
        .into_iter()
        .map(|document| {
            if is_empty_yaml_document(document) {
                None
            } else {
                validate_document(validator, document).err()
            }
        })
        .collect()
}

/// Validate a single document
pub fn validate_document(validator: &Validator, document: &[u8]) -> Result<(), ValidationError> {
    let value: Value = serde_yaml::from_slice(document).map_err(|e| ValidationError::Decode {
        causes: vec![e.to_string()],
    })?;
    validate_value_document(validator, value, true)
}

fn validate_value_document(
    validator: &Validator,
    value: Value,
    allow_list: bool,
) -> Result<(), ValidationError> {
    let kind = value.get("kind").and_then(Value::as_str).unwrap_or("");

    if kind == "List" {
        if !allow_list {
            return Err(ValidationError::Field(FieldError::invalid(
                &FieldPath::new("kind"),
                Value::String(kind.to_string()),
                "List kinds may only appear at the document root",
            )));
        }
        return validate_list(validator, value);
    }

    let api_version = value
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or("");
    let group = GroupVersion::from_api_version(api_version).group;
    if group == CRD_GROUP && kind == CRD_KIND {
        return crd_strategy::validate_crd_document(value);
    }

    let (_, parsed) = validator.parse_value(value)?;
    validator.validate(&parsed)
}

fn validate_list(validator: &Validator, value: Value) -> Result<(), ValidationError> {
    let items = match value.get("items") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => {
            return Err(ValidationError::Decode {
                causes: vec![format!("items must be a list, got {}", type_of(other))],
            });
        }
    };

    let mut errors = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        if let Err(err) = validate_value_document(validator, item, false) {
            errors.push(ValidationError::ListItem {
                index,
                source: Box::new(err),
            });
        }
    }

    match errors.is_empty() {
        true => Ok(()),
        false => Err(ValidationError::Join(errors)),
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
