//! End-to-end pipeline tests against in-memory schema fixtures
//!
//! Exercises the whole chain — source, patches, reference resolution,
//! structural conversion, decode/default/prune/validate — the way the CLI
//! drives it, without touching disk or network.

use std::sync::Arc;

use kubevet_openapi::meta;
use kubevet_openapi::{DocumentFetcher, Result as SourceResult, SchemaFetcher, SchemaSource, SourceMap};
use kubevet_schema::Document;
use kubevet_validator::{StatusReason, Validator, error_to_status, validate_document};
use serde_json::json;

struct FixtureSource(SourceMap);

impl SchemaSource for FixtureSource {
    fn enumerate(&self) -> SourceResult<SourceMap> {
        Ok(self.0.clone())
    }
}

fn core_v1_document() -> Document {
    let mut schemas = serde_json::Map::new();
    schemas.insert(
        "io.k8s.api.core.v1.ConfigMap".to_string(),
        json!({
            "type": "object",
            "description": "ConfigMap holds configuration data for pods to consume.",
            "properties": {
                "apiVersion": {"type": "string"},
                "kind": {"type": "string"},
                "metadata": {
                    "description": "Standard object's metadata.",
                    "allOf": [{"$ref": "#/components/schemas/io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta"}]
                },
                "data": {
                    "type": "object",
                    "additionalProperties": {"type": "string"}
                },
                "binaryData": {
                    "type": "object",
                    "additionalProperties": {"type": "string", "format": "byte"}
                },
                "immutable": {"type": "boolean"}
            },
            "x-kubernetes-group-version-kind": [
                {"group": "", "version": "v1", "kind": "ConfigMap"}
            ]
        }),
    );
    for (name, schema) in meta::meta_schema_definitions() {
        schemas.insert(name, serde_json::to_value(&schema).unwrap());
    }

    serde_json::from_value(json!({
        "components": {"schemas": schemas},
        "paths": {
            "/api/v1/namespaces/{namespace}/configmaps": {
                "post": {
                    "x-kubernetes-group-version-kind": [
                        {"group": "", "version": "v1", "kind": "ConfigMap"}
                    ]
                }
            }
        }
    }))
    .unwrap()
}

fn rbac_v1_document() -> Document {
    let mut schemas = serde_json::Map::new();
    schemas.insert(
        "io.k8s.api.rbac.v1.ClusterRole".to_string(),
        json!({
            "type": "object",
            "properties": {
                "apiVersion": {"type": "string"},
                "kind": {"type": "string"},
                "metadata": {
                    "allOf": [{"$ref": "#/components/schemas/io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta"}]
                },
                "rules": {
                    "type": "array",
                    "items": {"$ref": "#/components/schemas/io.k8s.api.rbac.v1.PolicyRule"}
                }
            },
            "x-kubernetes-group-version-kind": [
                {"group": "rbac.authorization.k8s.io", "version": "v1", "kind": "ClusterRole"}
            ]
        }),
    );
    schemas.insert(
        "io.k8s.api.rbac.v1.PolicyRule".to_string(),
        json!({
            "type": "object",
            "required": ["verbs"],
            "properties": {
                "verbs": {"type": "array", "items": {"type": "string"}},
                "apiGroups": {"type": "array", "items": {"type": "string"}},
                "resources": {"type": "array", "items": {"type": "string"}}
            }
        }),
    );
    for (name, schema) in meta::meta_schema_definitions() {
        schemas.insert(name, serde_json::to_value(&schema).unwrap());
    }

    serde_json::from_value(json!({
        "components": {"schemas": schemas},
        "paths": {
            "/apis/rbac.authorization.k8s.io/v1/clusterroles": {
                "post": {
                    "x-kubernetes-group-version-kind": [
                        {"group": "rbac.authorization.k8s.io", "version": "v1", "kind": "ClusterRole"}
                    ]
                }
            }
        }
    }))
    .unwrap()
}

fn fixture_validator() -> Validator {
    let mut map = SourceMap::new();
    map.insert(
        "api/v1".to_string(),
        Arc::new(DocumentFetcher::new(core_v1_document())) as Arc<dyn SchemaFetcher>,
    );
    map.insert(
        "apis/rbac.authorization.k8s.io/v1".to_string(),
        Arc::new(DocumentFetcher::new(rbac_v1_document())) as Arc<dyn SchemaFetcher>,
    );
    Validator::new(&FixtureSource(map)).unwrap()
}

#[test]
fn test_minimal_valid_configmap() {
    let validator = fixture_validator();
    let manifest = b"apiVersion: v1\nkind: ConfigMap\nmetadata: {name: myapp, finalizers: [finalizers.example.com]}\ndata: {key: value}\n";

    let result = validate_document(&validator, manifest);
    assert!(result.is_ok(), "expected success, got: {:?}", result.err());
    assert!(error_to_status(result.err().as_ref()).is_success());

    // defaulting materializes the system timestamp
    let (_, parsed) = validator.parse(manifest).unwrap();
    assert_eq!(parsed["metadata"]["creationTimestamp"], serde_json::Value::Null);
}

#[test]
fn test_configmap_bad_name() {
    let validator = fixture_validator();
    let manifest = b"apiVersion: v1\nkind: ConfigMap\nmetadata: {name: \"-bad\"}\ndata: {}\n";

    let err = validate_document(&validator, manifest).unwrap_err();
    let status = error_to_status(Some(&err));

    assert_eq!(status.reason, Some(StatusReason::Invalid));
    let causes = status.details.unwrap().causes;
    assert_eq!(causes.len(), 1);
    assert_eq!(causes[0].field, "metadata.name");
    assert!(causes[0].message.contains("RFC 1123 subdomain"));
}

#[test]
fn test_namespace_defaulted_for_namespaced_kinds() {
    let validator = fixture_validator();
    let (_, parsed) = validator
        .parse(b"apiVersion: v1\nkind: ConfigMap\nmetadata: {name: myapp}\n")
        .unwrap();
    // the caller's object is never mutated by validation
    validator.validate(&parsed).unwrap();
    assert!(parsed["metadata"].get("namespace").is_none());
}

#[test]
fn test_cluster_role_colon_name_accepted() {
    let validator = fixture_validator();
    let manifest = b"apiVersion: rbac.authorization.k8s.io/v1\nkind: ClusterRole\nmetadata: {name: \"system:admin\"}\nrules: [{verbs: [get], apiGroups: [\"\"], resources: [pods]}]\n";

    let result = validate_document(&validator, manifest);
    assert!(result.is_ok(), "expected success, got: {:?}", result.err());
}

#[test]
fn test_cluster_role_slash_name_rejected() {
    let validator = fixture_validator();
    let manifest = b"apiVersion: rbac.authorization.k8s.io/v1\nkind: ClusterRole\nmetadata: {name: \"system/admin\"}\nrules: []\n";

    let err = validate_document(&validator, manifest).unwrap_err();
    let status = error_to_status(Some(&err));

    assert_eq!(status.reason, Some(StatusReason::Invalid));
    let causes = status.details.unwrap().causes;
    assert!(causes.iter().any(|c| c.message.contains("may not contain '/'")));
}

#[test]
fn test_configmap_unknown_field_rejected() {
    let validator = fixture_validator();
    let manifest = b"apiVersion: v1\nkind: ConfigMap\nmetadata: {name: myapp}\ndtaa: {key: value}\n";

    let err = validator.parse(manifest).unwrap_err();
    assert!(err.to_string().contains("value provided for unknown field"));
    assert!(err.to_string().contains("dtaa"));
}

#[test]
fn test_configmap_wrong_value_type() {
    let validator = fixture_validator();
    let manifest = b"apiVersion: v1\nkind: ConfigMap\nmetadata: {name: myapp}\ndata: {key: [1, 2]}\n";

    let (_, parsed) = validator.parse(manifest).unwrap();
    let err = validator.validate(&parsed).unwrap_err();
    let status = error_to_status(Some(&err));
    assert_eq!(status.reason, Some(StatusReason::Invalid));
    let causes = status.details.unwrap().causes;
    assert!(causes.iter().any(|c| c.field == "data.key"));
}

#[test]
fn test_empty_binary_data_accepted() {
    // the AllowEmptyByteFormat patch admits empty byte strings for builtins
    let validator = fixture_validator();
    let manifest = b"apiVersion: v1\nkind: ConfigMap\nmetadata: {name: myapp}\nbinaryData: {empty: \"\", data: aGVsbG8=}\n";
    assert!(validate_document(&validator, manifest).is_ok());
}

#[test]
fn test_invalid_binary_data_rejected() {
    let validator = fixture_validator();
    let manifest =
        b"apiVersion: v1\nkind: ConfigMap\nmetadata: {name: myapp}\nbinaryData: {bad: \"!!!\"}\n";

    let err = validate_document(&validator, manifest).unwrap_err();
    let status = error_to_status(Some(&err));
    assert_eq!(status.reason, Some(StatusReason::Invalid));
}

#[test]
fn test_list_of_valid_items() {
    let validator = fixture_validator();
    let manifest = br#"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: ConfigMap
    metadata: {name: first}
  - apiVersion: v1
    kind: ConfigMap
    metadata: {name: second}
"#;
    assert!(validate_document(&validator, manifest).is_ok());
}

#[test]
fn test_list_aggregates_item_errors() {
    let validator = fixture_validator();
    let manifest = br#"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: ConfigMap
    metadata: {name: ok}
  - apiVersion: v1
    kind: ConfigMap
    metadata: {name: "-bad"}
"#;
    let err = validate_document(&validator, manifest).unwrap_err();
    let status = error_to_status(Some(&err));

    assert_eq!(status.reason, Some(StatusReason::Invalid));
    let causes = status.details.unwrap().causes;
    assert_eq!(causes.len(), 1);
    assert!(causes[0].message.starts_with("items[1]: "));
}

#[test]
fn test_nested_list_rejected() {
    let validator = fixture_validator();
    let manifest = br#"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: List
    items: []
"#;
    let err = validate_document(&validator, manifest).unwrap_err();
    let status = error_to_status(Some(&err));

    assert_eq!(status.reason, Some(StatusReason::Invalid));
    let causes = status.details.unwrap().causes;
    assert!(causes[0].message.contains("List kinds may only appear at the document root"));
    assert!(causes[0].field == "kind" || causes[0].message.contains("kind"));
}

#[test]
fn test_unknown_group_version() {
    let validator = fixture_validator();
    let manifest = b"apiVersion: example.com/v1\nkind: Widget\nmetadata: {name: w}\n";

    let err = validate_document(&validator, manifest).unwrap_err();
    let status = error_to_status(Some(&err));

    assert_eq!(status.reason, Some(StatusReason::InternalError));
    assert!(status
        .message
        .unwrap()
        .contains("failed to locate OpenAPI spec for GV: example.com/v1"));
}

#[test]
fn test_undecodable_document_is_bad_request() {
    let validator = fixture_validator();
    let err = validate_document(&validator, b"a: b\na: c\n").unwrap_err();
    let status = error_to_status(Some(&err));
    assert_eq!(status.reason, Some(StatusReason::BadRequest));
    assert_eq!(status.code, 400);
}

#[test]
fn test_crd_document_bypasses_structural_path() {
    let validator = fixture_validator();
    // no apiextensions schemas are in the fixture catalog; the CRD must
    // still validate via the native strategy
    let manifest = br#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  scope: Namespaced
  names: {kind: Widget, plural: widgets}
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema: {type: object}
"#;
    assert!(validate_document(&validator, manifest).is_ok());
}

#[test]
fn test_validator_entries_are_cached() {
    let validator = fixture_validator();
    let gvk = kubevet_schema::GroupVersionKind::new("", "v1", "ConfigMap");
    let first = validator.entry_for_gvk(&gvk).unwrap();
    let second = validator.entry_for_gvk(&gvk).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
