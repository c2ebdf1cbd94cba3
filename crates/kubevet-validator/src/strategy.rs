//! Create-time admission sequence
//!
//! The order the apiserver applies to an object before persisting it:
//! system fields, defaulting, null pruning, structural pruning, object-meta
//! coercion, schema validation, then object-meta validation. Name checks
//! interact with the custom-validator registry: the default DNS-subdomain
//! errors are filtered out when a custom rule matches the GVK and name
//! validation re-runs under that rule.

use serde_json::Value;

use crate::custom::{CustomValidator, find_custom_validator};
use crate::defaulting;
use crate::error::ValidationError;
use crate::field::{ErrorType, FieldError, FieldPath};
use crate::names;
use crate::objectmeta;
use crate::pruning;
use crate::schema_validation;
use crate::validator::ValidatorEntry;
use kubevet_schema::GroupVersionKind;

/// Run the full create sequence; the object is mutated (defaults, pruning)
pub fn before_create(
    entry: &ValidatorEntry,
    gvk: &GroupVersionKind,
    obj: &mut Value,
) -> Result<(), ValidationError> {
    if !obj.is_object() {
        return Err(ValidationError::Internal(
            "passed object cannot be nil".to_string(),
        ));
    }

    let structural = entry.structural()?;
    let namespace_scoped = entry.is_namespace_scoped();
    let custom = find_custom_validator(gvk);

    if let Value::Object(map) = &mut *obj {
        objectmeta::fill_system_fields(map);
    }
    defaulting::apply_defaults(obj, &structural);
    defaulting::prune_non_nullable_nulls_without_defaults(obj, &structural);
    if !entry.preserves_unknown_fields() {
        pruning::prune(obj, &structural, false);
    }

    let mut errors: Vec<FieldError> = Vec::new();

    if let Value::Object(map) = &mut *obj {
        let (_, meta_errors) = objectmeta::coerce_object_meta(map, false);
        errors.extend(meta_errors);
    }

    errors.extend(schema_validation::validate(entry.schema(), obj));

    if let Some(map) = obj.as_object() {
        let base_errors = objectmeta::validate_object_meta(
            map,
            namespace_scoped,
            &names::validate_dns_subdomain_name,
        );

        match custom {
            None => errors.extend(base_errors),
            Some(custom) => {
                let had_name_error = base_errors
                    .iter()
                    .any(|e| e.field == "metadata.name" && e.error_type == ErrorType::Invalid);

                errors.extend(base_errors.into_iter().filter(|e| {
                    !(e.field == "metadata.name" && e.error_type == ErrorType::Invalid)
                }));

                if had_name_error {
                    errors.extend(validate_names_with(map, custom));
                }
            }
        }
    }

    if let Some(custom) = custom {
        errors.extend(custom.validate_resource(obj, namespace_scoped));
    }

    match ValidationError::join(errors.into_iter().map(ValidationError::Field).collect()) {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

/// Re-run just the name checks under a custom rule
fn validate_names_with(
    map: &serde_json::Map<String, Value>,
    custom: &dyn CustomValidator,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let meta_path = FieldPath::new("metadata");
    let Some(Value::Object(metadata)) = map.get("metadata") else {
        return errors;
    };

    if let Some(name) = metadata.get("name").and_then(Value::as_str) {
        for message in custom.validate_name(name, false) {
            errors.push(FieldError::invalid(
                &meta_path.child("name"),
                Value::String(name.to_string()),
                message,
            ));
        }
    }
    if let Some(generate_name) = metadata.get("generateName").and_then(Value::as_str) {
        for message in custom.validate_name(generate_name, true) {
            errors.push(FieldError::invalid(
                &meta_path.child("generateName"),
                Value::String(generate_name.to_string()),
                message,
            ));
        }
    }
    errors
}
