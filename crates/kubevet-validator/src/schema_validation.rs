//! Value validation against a resolved OpenAPI schema
//!
//! The per-field checking the apiserver performs after decode: types,
//! nullability, int-or-string, enums, patterns, bounds, required fields,
//! composition, and the formats the pipeline understands. Operates on the
//! reference-free schema, producing field errors with dotted paths.

use base64::Engine as _;
use serde_json::Value;

use crate::field::{FieldError, FieldPath};
use kubevet_schema::{Items, Schema, SchemaOrBool};

/// Validate a decoded object against its schema
pub fn validate(schema: &Schema, value: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();
    validate_value(schema, value, &FieldPath::root(), &mut errors);
    errors
}

fn validate_value(schema: &Schema, value: &Value, path: &FieldPath, errors: &mut Vec<FieldError>) {
    if value.is_null() {
        if !schema.nullable {
            if let Some(type_name) = schema.type_name() {
                errors.push(FieldError::invalid(
                    path,
                    Value::Null,
                    format!("must be of type {type_name}"),
                ));
            } else if is_int_or_string(schema) {
                errors.push(FieldError::invalid(
                    path,
                    Value::Null,
                    "must be of type integer or string",
                ));
            }
        }
        return;
    }

    if is_int_or_string(schema) {
        if !(value.is_string() || is_integer(value)) {
            errors.push(FieldError::invalid(
                path,
                value.clone(),
                "must be of type integer or string",
            ));
            return;
        }
    } else if let Some(type_name) = schema.type_name() {
        if !type_matches(type_name, value) {
            errors.push(FieldError::invalid(
                path,
                value.clone(),
                format!("must be of type {type_name}"),
            ));
            return;
        }
    }

    if !schema.enum_values.is_empty() && !schema.enum_values.contains(value) {
        let supported: Vec<String> = schema.enum_values.iter().map(render_enum).collect();
        errors.push(FieldError::not_supported(path, value.clone(), &supported));
    }

    match value {
        Value::String(s) => validate_string(schema, s, path, errors),
        Value::Number(_) => validate_number(schema, value, path, errors),
        Value::Array(items) => validate_array(schema, items, path, errors),
        Value::Object(map) => validate_object(schema, map, path, errors),
        _ => {}
    }

    for member in &schema.all_of {
        validate_value(member, value, path, errors);
    }

    if !schema.any_of.is_empty() {
        let satisfied = schema.any_of.iter().any(|member| {
            let mut member_errors = Vec::new();
            validate_value(member, value, path, &mut member_errors);
            member_errors.is_empty()
        });
        if !satisfied {
            errors.push(FieldError::invalid(
                path,
                value.clone(),
                "must validate at least one schema (anyOf)",
            ));
        }
    }

    if !schema.one_of.is_empty() {
        let matches = schema
            .one_of
            .iter()
            .filter(|member| {
                let mut member_errors = Vec::new();
                validate_value(member, value, path, &mut member_errors);
                member_errors.is_empty()
            })
            .count();
        if matches != 1 {
            errors.push(FieldError::invalid(
                path,
                value.clone(),
                "must validate one and only one schema (oneOf)",
            ));
        }
    }

    if let Some(not) = &schema.not {
        let mut not_errors = Vec::new();
        validate_value(not, value, path, &mut not_errors);
        if not_errors.is_empty() {
            errors.push(FieldError::invalid(
                path,
                value.clone(),
                "must not validate the schema (not)",
            ));
        }
    }
}

fn is_int_or_string(schema: &Schema) -> bool {
    schema
        .extensions
        .get_bool("x-kubernetes-int-or-string")
        .unwrap_or(false)
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

fn type_matches(type_name: &str, value: &Value) -> bool {
    match type_name {
        "string" => value.is_string(),
        "integer" => is_integer(value),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

fn render_enum(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

fn validate_string(schema: &Schema, s: &str, path: &FieldPath, errors: &mut Vec<FieldError>) {
    let length = s.chars().count() as u64;
    if let Some(max_length) = schema.max_length {
        if length > max_length {
            errors.push(FieldError::too_long(
                path,
                Value::String(s.to_string()),
                max_length as usize,
            ));
        }
    }
    if let Some(min_length) = schema.min_length {
        if length < min_length {
            errors.push(FieldError::invalid(
                path,
                Value::String(s.to_string()),
                format!("must be at least {min_length} characters long"),
            ));
        }
    }

    if let Some(pattern) = &schema.pattern {
        // an uncompilable pattern is a schema bug, not a document error
        if let Ok(regex) = regex::Regex::new(pattern) {
            if !regex.is_match(s) {
                errors.push(FieldError::invalid(
                    path,
                    Value::String(s.to_string()),
                    format!("must match the pattern {pattern}"),
                ));
            }
        }
    }

    match schema.format.as_deref() {
        Some("byte") => {
            if base64::engine::general_purpose::STANDARD.decode(s).is_err() {
                errors.push(FieldError::invalid(
                    path,
                    Value::String(s.to_string()),
                    "must be a base64 encoded string",
                ));
            }
        }
        Some("date-time" | "datetime") => {
            if chrono::DateTime::parse_from_rfc3339(s).is_err() {
                errors.push(FieldError::invalid(
                    path,
                    Value::String(s.to_string()),
                    "must be an RFC3339 date-time",
                ));
            }
        }
        Some("date") => {
            if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
                errors.push(FieldError::invalid(
                    path,
                    Value::String(s.to_string()),
                    "must be an RFC3339 full-date",
                ));
            }
        }
        _ => {}
    }
}

fn validate_number(schema: &Schema, value: &Value, path: &FieldPath, errors: &mut Vec<FieldError>) {
    let Some(number) = value.as_f64() else {
        return;
    };

    if let Some(maximum) = schema.maximum.as_ref().and_then(serde_json::Number::as_f64) {
        let violated = if schema.exclusive_maximum {
            number >= maximum
        } else {
            number > maximum
        };
        if violated {
            let relation = if schema.exclusive_maximum { "less than" } else { "less than or equal to" };
            errors.push(FieldError::invalid(
                path,
                value.clone(),
                format!("must be {relation} {maximum}"),
            ));
        }
    }
    if let Some(minimum) = schema.minimum.as_ref().and_then(serde_json::Number::as_f64) {
        let violated = if schema.exclusive_minimum {
            number <= minimum
        } else {
            number < minimum
        };
        if violated {
            let relation = if schema.exclusive_minimum { "greater than" } else { "greater than or equal to" };
            errors.push(FieldError::invalid(
                path,
                value.clone(),
                format!("must be {relation} {minimum}"),
            ));
        }
    }
    if let Some(multiple_of) = schema.multiple_of.as_ref().and_then(serde_json::Number::as_f64) {
        if multiple_of != 0.0 {
            let quotient = number / multiple_of;
            if (quotient - quotient.round()).abs() > 1e-9 {
                errors.push(FieldError::invalid(
                    path,
                    value.clone(),
                    format!("must be a multiple of {multiple_of}"),
                ));
            }
        }
    }

    match schema.format.as_deref() {
        Some("int32") => {
            let in_range = value
                .as_i64()
                .is_some_and(|n| i32::try_from(n).is_ok());
            if is_integer(value) && !in_range {
                errors.push(FieldError::invalid(
                    path,
                    value.clone(),
                    "must be a valid int32",
                ));
            }
        }
        Some("int64") => {
            if is_integer(value) && value.as_i64().is_none() {
                errors.push(FieldError::invalid(
                    path,
                    value.clone(),
                    "must be a valid int64",
                ));
            }
        }
        _ => {}
    }
}

fn validate_array(schema: &Schema, items: &[Value], path: &FieldPath, errors: &mut Vec<FieldError>) {
    if let Some(max_items) = schema.max_items {
        if items.len() as u64 > max_items {
            errors.push(FieldError::invalid(
                path,
                Value::Array(items.to_vec()),
                format!("must have at most {max_items} items"),
            ));
        }
    }
    if let Some(min_items) = schema.min_items {
        if (items.len() as u64) < min_items {
            errors.push(FieldError::invalid(
                path,
                Value::Array(items.to_vec()),
                format!("must have at least {min_items} items"),
            ));
        }
    }

    if schema.unique_items {
        let mut seen: Vec<&Value> = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if seen.contains(&item) {
                errors.push(FieldError::invalid(
                    &path.index(index),
                    item.clone(),
                    "must be unique",
                ));
            } else {
                seen.push(item);
            }
        }
    }

    if let Some(item_schema) = schema.items.as_deref() {
        match item_schema {
            Items::Single(element) => {
                for (index, item) in items.iter().enumerate() {
                    validate_value(element, item, &path.index(index), errors);
                }
            }
            Items::Tuple(schemas) => {
                for (index, (item, element)) in items.iter().zip(schemas).enumerate() {
                    validate_value(element, item, &path.index(index), errors);
                }
            }
        }
    }
}

fn validate_object(
    schema: &Schema,
    map: &serde_json::Map<String, Value>,
    path: &FieldPath,
    errors: &mut Vec<FieldError>,
) {
    for required in &schema.required {
        if !map.contains_key(required) {
            errors.push(FieldError::required(&child_path(path, required), ""));
        }
    }

    if let Some(max_properties) = schema.max_properties {
        if map.len() as u64 > max_properties {
            errors.push(FieldError::invalid(
                path,
                Value::Object(map.clone()),
                format!("must have at most {max_properties} properties"),
            ));
        }
    }
    if let Some(min_properties) = schema.min_properties {
        if (map.len() as u64) < min_properties {
            errors.push(FieldError::invalid(
                path,
                Value::Object(map.clone()),
                format!("must have at least {min_properties} properties"),
            ));
        }
    }

    for (key, child) in map {
        let child_path = child_path(path, key);

        if let Some(property) = schema.properties.get(key) {
            validate_value(property, child, &child_path, errors);
            continue;
        }

        let pattern_match = schema.pattern_properties.iter().find(|(pattern, _)| {
            regex::Regex::new(pattern).is_ok_and(|regex| regex.is_match(key))
        });
        if let Some((_, property)) = pattern_match {
            validate_value(property, child, &child_path, errors);
            continue;
        }

        match schema.additional_properties.as_deref() {
            Some(SchemaOrBool::Bool(false)) => {
                errors.push(FieldError::forbidden(&child_path, "forbidden property"));
            }
            Some(SchemaOrBool::Schema(additional)) => {
                validate_value(additional, child, &child_path, errors);
            }
            _ => {}
        }
    }
}

fn child_path(path: &FieldPath, key: &str) -> FieldPath {
    if path.as_str().is_empty() {
        FieldPath::new(key)
    } else {
        path.child(key)
    }
}
