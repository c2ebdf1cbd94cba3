//! Object metadata coercion and validation
//!
//! The decoder-side half mirrors what the apiserver does to unstructured
//! metadata on admission: verify the shape of every known field, report and
//! prune unknown metadata fields, and materialize the system fields a
//! round-trip through ObjectMeta would produce (`creationTimestamp: null`).
//! The validation half checks name/generateName/namespace against the scope
//! rules, plus label values and annotation/finalizer keys.

use serde_json::{Map, Value};

use crate::field::{FieldError, FieldPath};
use crate::names;

/// Materialize the implicit metadata fields present after an apiserver
/// round-trip, so parsed objects compare equal to server-side output
pub fn fill_system_fields(obj: &mut Map<String, Value>) {
    let metadata = obj
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(metadata) = metadata {
        metadata
            .entry("creationTimestamp")
            .or_insert(Value::Null);
    }
}

/// Shape-check the metadata object, pruning unknown fields and returning
/// their paths. Malformed known fields either error or, in drop-malformed
/// mode, are removed.
pub fn coerce_object_meta(
    obj: &mut Map<String, Value>,
    drop_malformed: bool,
) -> (Vec<String>, Vec<FieldError>) {
    let mut unknown = Vec::new();
    let mut errors = Vec::new();
    let meta_path = FieldPath::new("metadata");

    let Some(metadata) = obj.get_mut("metadata") else {
        return (unknown, errors);
    };
    let Value::Object(metadata) = metadata else {
        errors.push(FieldError::type_invalid(
            &meta_path,
            metadata.clone(),
            "must be an object",
        ));
        return (unknown, errors);
    };

    let keys: Vec<String> = metadata.keys().cloned().collect();
    for key in keys {
        let path = meta_path.child(&key);
        let well_formed = match (key.as_str(), &metadata[&key]) {
            (
                "name" | "generateName" | "namespace" | "uid" | "resourceVersion" | "selfLink",
                value,
            ) => check(value.is_string(), "must be a string"),
            ("creationTimestamp" | "deletionTimestamp", value) => {
                check(value.is_string() || value.is_null(), "must be a string or null")
            }
            ("generation" | "deletionGracePeriodSeconds", value) => {
                check(value.is_i64() || value.is_u64(), "must be an integer")
            }
            ("labels" | "annotations", value) => check(
                matches!(value, Value::Object(map) if map.values().all(Value::is_string)),
                "must be a map of string keys to string values",
            ),
            ("finalizers", value) => check(
                matches!(value, Value::Array(items) if items.iter().all(Value::is_string)),
                "must be a list of strings",
            ),
            ("ownerReferences" | "managedFields", value) => check(
                matches!(value, Value::Array(items) if items.iter().all(Value::is_object)),
                "must be a list of objects",
            ),
            (_, _) => {
                unknown.push(path.to_string());
                metadata.remove(&key);
                continue;
            }
        };

        if let Err(detail) = well_formed {
            if drop_malformed {
                metadata.remove(&key);
            } else {
                errors.push(FieldError::type_invalid(
                    &path,
                    metadata.get(&key).cloned().unwrap_or(Value::Null),
                    detail,
                ));
            }
        }
    }

    (unknown, errors)
}

fn check(ok: bool, detail: &'static str) -> Result<(), &'static str> {
    if ok { Ok(()) } else { Err(detail) }
}

/// Validate metadata per the apiserver's create-time rules, with the name
/// rule supplied by the caller (default or custom)
pub fn validate_object_meta(
    obj: &Map<String, Value>,
    namespace_scoped: bool,
    name_validator: &dyn Fn(&str, bool) -> Vec<String>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let meta_path = FieldPath::new("metadata");

    let Some(Value::Object(metadata)) = obj.get("metadata") else {
        errors.push(FieldError::required(
            &meta_path.child("name"),
            "name or generateName is required",
        ));
        return errors;
    };

    let name = metadata.get("name").and_then(Value::as_str).unwrap_or("");
    let generate_name = metadata
        .get("generateName")
        .and_then(Value::as_str)
        .unwrap_or("");

    if !generate_name.is_empty() {
        for message in name_validator(generate_name, true) {
            errors.push(FieldError::invalid(
                &meta_path.child("generateName"),
                Value::String(generate_name.to_string()),
                message,
            ));
        }
    }
    if !name.is_empty() {
        for message in name_validator(name, false) {
            errors.push(FieldError::invalid(
                &meta_path.child("name"),
                Value::String(name.to_string()),
                message,
            ));
        }
    } else if generate_name.is_empty() {
        errors.push(FieldError::required(
            &meta_path.child("name"),
            "name or generateName is required",
        ));
    }

    let namespace = metadata
        .get("namespace")
        .and_then(Value::as_str)
        .unwrap_or("");
    if namespace_scoped {
        if namespace.is_empty() {
            errors.push(FieldError::required(&meta_path.child("namespace"), ""));
        } else {
            for message in names::is_dns1123_label(namespace) {
                errors.push(FieldError::invalid(
                    &meta_path.child("namespace"),
                    Value::String(namespace.to_string()),
                    message,
                ));
            }
        }
    } else if !namespace.is_empty() {
        errors.push(FieldError::forbidden(
            &meta_path.child("namespace"),
            "not allowed on this type",
        ));
    }

    if let Some(Value::Object(labels)) = metadata.get("labels") {
        let labels_path = meta_path.child("labels");
        for (key, value) in labels {
            for message in names::is_qualified_name(key) {
                errors.push(FieldError::invalid(
                    &labels_path,
                    Value::String(key.clone()),
                    message,
                ));
            }
            if let Some(value) = value.as_str() {
                for message in names::is_valid_label_value(value) {
                    errors.push(FieldError::invalid(
                        &labels_path.key(key),
                        Value::String(value.to_string()),
                        message,
                    ));
                }
            }
        }
    }

    if let Some(Value::Object(annotations)) = metadata.get("annotations") {
        let annotations_path = meta_path.child("annotations");
        for key in annotations.keys() {
            for message in names::is_qualified_name(key) {
                errors.push(FieldError::invalid(
                    &annotations_path,
                    Value::String(key.clone()),
                    message,
                ));
            }
        }
    }

    if let Some(Value::Array(finalizers)) = metadata.get("finalizers") {
        let finalizers_path = meta_path.child("finalizers");
        for (index, finalizer) in finalizers.iter().enumerate() {
            let Some(finalizer) = finalizer.as_str() else {
                continue;
            };
            for message in names::is_qualified_name(finalizer) {
                errors.push(FieldError::invalid(
                    &finalizers_path.index(index),
                    Value::String(finalizer.to_string()),
                    message,
                ));
            }
        }
    }

    errors
}
