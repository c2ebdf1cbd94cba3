//! Injected metadata schema definitions
//!
//! CRD-generated group-version documents must carry the well-known
//! `ObjectMeta` definition and its transitive dependencies so that the
//! injected `metadata` property resolves. These mirror the definitions the
//! apiserver publishes for `io.k8s.apimachinery.pkg.apis.meta.v1`, trimmed
//! to the fields admission actually coerces.

use std::collections::BTreeMap;

use kubevet_schema::Schema;
use serde_json::json;

pub const OBJECT_META: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta";
pub const OWNER_REFERENCE: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.OwnerReference";
pub const MANAGED_FIELDS_ENTRY: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.ManagedFieldsEntry";
pub const TIME: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.Time";
pub const FIELDS_V1: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.FieldsV1";

fn ref_to(definition: &str) -> serde_json::Value {
    json!({ "$ref": format!("#/components/schemas/{definition}") })
}

/// The ObjectMeta definition family, keyed by qualified name
pub fn meta_schema_definitions() -> BTreeMap<String, Schema> {
    let object_meta = json!({
        "type": "object",
        "description": "Standard object's metadata.",
        "properties": {
            "name": {
                "type": "string",
                "description": "Name must be unique within a namespace."
            },
            "generateName": {
                "type": "string",
                "description": "An optional prefix used by the server to generate a unique name."
            },
            "namespace": {
                "type": "string",
                "description": "Namespace defines the space within which each name must be unique."
            },
            "labels": {
                "type": "object",
                "additionalProperties": {"type": "string"}
            },
            "annotations": {
                "type": "object",
                "additionalProperties": {"type": "string"}
            },
            "finalizers": {
                "type": "array",
                "items": {"type": "string"},
                "x-kubernetes-patch-strategy": "merge"
            },
            "uid": {"type": "string"},
            "resourceVersion": {"type": "string"},
            "generation": {"type": "integer", "format": "int64"},
            "creationTimestamp": ref_to(TIME),
            "deletionTimestamp": ref_to(TIME),
            "deletionGracePeriodSeconds": {"type": "integer", "format": "int64"},
            "ownerReferences": {
                "type": "array",
                "items": ref_to(OWNER_REFERENCE),
                "x-kubernetes-patch-merge-key": "uid",
                "x-kubernetes-patch-strategy": "merge"
            },
            "managedFields": {
                "type": "array",
                "items": ref_to(MANAGED_FIELDS_ENTRY)
            },
            "selfLink": {"type": "string"}
        }
    });

    let owner_reference = json!({
        "type": "object",
        "description": "OwnerReference contains enough information to let you identify an owning object.",
        "required": ["apiVersion", "kind", "name", "uid"],
        "properties": {
            "apiVersion": {"type": "string"},
            "kind": {"type": "string"},
            "name": {"type": "string"},
            "uid": {"type": "string"},
            "controller": {"type": "boolean"},
            "blockOwnerDeletion": {"type": "boolean"}
        },
        "x-kubernetes-map-type": "atomic"
    });

    let managed_fields_entry = json!({
        "type": "object",
        "properties": {
            "manager": {"type": "string"},
            "operation": {"type": "string"},
            "apiVersion": {"type": "string"},
            "time": ref_to(TIME),
            "fieldsType": {"type": "string"},
            "fieldsV1": ref_to(FIELDS_V1),
            "subresource": {"type": "string"}
        }
    });

    let time = json!({
        "type": "string",
        "format": "date-time",
        "nullable": true
    });

    let fields_v1 = json!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    });

    [
        (OBJECT_META, object_meta),
        (OWNER_REFERENCE, owner_reference),
        (MANAGED_FIELDS_ENTRY, managed_fields_entry),
        (TIME, time),
        (FIELDS_V1, fields_v1),
    ]
    .into_iter()
    .map(|(name, value)| {
        let schema = serde_json::from_value(value).expect("static schema literal");
        (name.to_string(), schema)
    })
    .collect()
}

/// The root properties the apiserver implicitly injects into every custom
/// resource schema
pub fn injected_root_properties() -> BTreeMap<String, Schema> {
    let entries = [
        (
            "apiVersion",
            json!({
                "type": "string",
                "description": "APIVersion defines the versioned schema of this representation of an object."
            }),
        ),
        (
            "kind",
            json!({
                "type": "string",
                "description": "Kind is a string value representing the REST resource this object represents."
            }),
        ),
        ("metadata", ref_to(OBJECT_META)),
    ];

    entries
        .into_iter()
        .map(|(name, value)| {
            let schema = serde_json::from_value(value).expect("static schema literal");
            (name.to_string(), schema)
        })
        .collect()
}
