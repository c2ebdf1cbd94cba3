//! Hand-written CustomResourceDefinition validation
//!
//! The published CRD schema is self-recursive and cannot be converted to a
//! structural schema, so CRD manifests bypass the OpenAPI path entirely and
//! are validated against the native types.

use serde_json::Value;

use crate::error::ValidationError;
use crate::field::{FieldError, FieldPath};
use crate::names;
use crate::objectmeta;
use kubevet_schema::{CrdScope, CustomResourceDefinition};

/// Validate a decoded CRD document
pub fn validate_crd_document(value: Value) -> Result<(), ValidationError> {
    let crd = match CustomResourceDefinition::from_value(value.clone()) {
        Ok(crd) => crd,
        Err(err) => {
            return Err(ValidationError::Decode {
                causes: vec![err.to_string()],
            });
        }
    };

    let mut errors = Vec::new();

    if let Some(map) = value.as_object() {
        errors.extend(objectmeta::validate_object_meta(
            map,
            false,
            &names::validate_dns_subdomain_name,
        ));
    }
    errors.extend(validate_crd(&crd));

    match ValidationError::join(errors.into_iter().map(ValidationError::Field).collect()) {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

fn validate_crd(crd: &CustomResourceDefinition) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let spec_path = FieldPath::new("spec");

    let group_path = spec_path.child("group");
    if crd.spec.group.is_empty() {
        errors.push(FieldError::required(&group_path, ""));
    } else {
        for message in names::is_dns1123_subdomain(&crd.spec.group) {
            errors.push(FieldError::invalid(
                &group_path,
                Value::String(crd.spec.group.clone()),
                message,
            ));
        }
    }

    let names_path = spec_path.child("names");
    if crd.spec.names.plural.is_empty() {
        errors.push(FieldError::required(&names_path.child("plural"), ""));
    } else {
        for message in names::is_dns1123_label(&crd.spec.names.plural) {
            errors.push(FieldError::invalid(
                &names_path.child("plural"),
                Value::String(crd.spec.names.plural.clone()),
                message,
            ));
        }
    }
    if crd.spec.names.kind.is_empty() {
        errors.push(FieldError::required(&names_path.child("kind"), ""));
    }
    if let Some(singular) = &crd.spec.names.singular {
        for message in names::is_dns1123_label(singular) {
            errors.push(FieldError::invalid(
                &names_path.child("singular"),
                Value::String(singular.clone()),
                message,
            ));
        }
    }

    // the CRD's own name must tie it to what it defines
    if !crd.spec.names.plural.is_empty() && !crd.spec.group.is_empty() {
        let expected = format!("{}.{}", crd.spec.names.plural, crd.spec.group);
        if crd.metadata.name != expected {
            errors.push(FieldError::invalid(
                &FieldPath::new("metadata").child("name"),
                Value::String(crd.metadata.name.clone()),
                format!("must be spec.names.plural+\".\"+spec.group: {expected}"),
            ));
        }
    }

    if crd.spec.scope == CrdScope::Unknown {
        errors.push(FieldError::not_supported(
            &spec_path.child("scope"),
            Value::Null,
            &["Cluster".to_string(), "Namespaced".to_string()],
        ));
    }

    let versions_path = spec_path.child("versions");
    if crd.spec.versions.is_empty() {
        errors.push(FieldError::required(&versions_path, ""));
        return errors;
    }

    let mut seen = std::collections::BTreeSet::new();
    for (index, version) in crd.spec.versions.iter().enumerate() {
        let version_path = versions_path.index(index).child("name");
        if !seen.insert(version.name.clone()) {
            errors.push(FieldError {
                error_type: crate::field::ErrorType::Duplicate,
                field: version_path.to_string(),
                bad_value: Value::String(version.name.clone()),
                detail: String::new(),
            });
        }
        for message in names::is_dns1123_label(&version.name) {
            errors.push(FieldError::invalid(
                &version_path,
                Value::String(version.name.clone()),
                message,
            ));
        }
    }

    let storage_count = crd.spec.versions.iter().filter(|v| v.storage).count();
    if storage_count != 1 {
        errors.push(FieldError::invalid(
            &versions_path,
            Value::Array(Vec::new()),
            "must have exactly one version marked as storage version",
        ));
    }
    if !crd.spec.versions.iter().any(|v| v.served) {
        errors.push(FieldError::invalid(
            &versions_path,
            Value::Array(Vec::new()),
            "must have at least one version marked as serving",
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_crd() -> Value {
        json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": {"name": "widgets.example.com"},
            "spec": {
                "group": "example.com",
                "scope": "Namespaced",
                "names": {"kind": "Widget", "plural": "widgets"},
                "versions": [
                    {"name": "v1", "served": true, "storage": true,
                     "schema": {"openAPIV3Schema": {"type": "object"}}}
                ]
            }
        })
    }

    #[test]
    fn test_valid_crd_passes() {
        assert!(validate_crd_document(valid_crd()).is_ok());
    }

    #[test]
    fn test_name_must_match_plural_and_group() {
        let mut crd = valid_crd();
        crd["metadata"]["name"] = json!("wrong-name");
        let err = validate_crd_document(crd).unwrap_err();
        assert!(err.to_string().contains("spec.names.plural"));
    }

    #[test]
    fn test_missing_group() {
        let mut crd = valid_crd();
        crd["spec"]["group"] = json!("");
        crd["metadata"]["name"] = json!("widgets.");
        let err = validate_crd_document(crd).unwrap_err();
        assert!(err.to_string().contains("spec.group"));
    }

    #[test]
    fn test_storage_version_count() {
        let mut crd = valid_crd();
        crd["spec"]["versions"] = json!([
            {"name": "v1", "served": true, "storage": true},
            {"name": "v2", "served": true, "storage": true}
        ]);
        let err = validate_crd_document(crd).unwrap_err();
        assert!(err.to_string().contains("exactly one version"));
    }

    #[test]
    fn test_duplicate_versions() {
        let mut crd = valid_crd();
        crd["spec"]["versions"] = json!([
            {"name": "v1", "served": true, "storage": true},
            {"name": "v1", "served": true, "storage": false}
        ]);
        let err = validate_crd_document(crd).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_unknown_scope() {
        let mut crd = valid_crd();
        crd["spec"]["scope"] = json!("Sideways");
        let err = validate_crd_document(crd).unwrap_err();
        assert!(err.to_string().contains("spec.scope"));
    }

    #[test]
    fn test_undecodable_crd_is_bad_request() {
        let err = validate_crd_document(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": {"name": "x"},
            "spec": "not an object"
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Decode { .. }));
    }
}
