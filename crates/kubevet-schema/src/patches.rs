//! Compatibility patches for published schemas
//!
//! Kubernetes publishes OpenAPI documents that disagree with what the
//! apiserver actually accepts: byte-format strings may be empty, several
//! custom-marshalled types accept null, IntOrString is encoded as an
//! unstructural `oneOf`, and struct defaults of `{}` appear on types whose
//! marshalling makes them meaningless. Each discrepancy is reconciled by an
//! ordered patch applied to every schema definition at catalog-load time;
//! later patches see earlier patches' output.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::formats::is_supported_format;
use crate::gvk::GroupVersion;
use crate::openapi::Schema;
use crate::visitor::{Postorder, VisitContext, visit_schema};

const INT_OR_STRING: &str = "io.k8s.apimachinery.pkg.util.intstr.IntOrString";

/// Native types with custom `MarshalJSON` handling for null/empty
static NULLABLE_SCHEMAS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    BTreeSet::from([
        "io.k8s.apimachinery.pkg.runtime.RawExtension",
        "io.k8s.apimachinery.pkg.apis.meta.v1.Time",
        "io.k8s.apimachinery.pkg.apis.meta.v1.MicroTime",
        "io.k8s.apimachinery.pkg.apis.meta.v1.Duration",
        "io.k8s.apiextensions-apiserver.pkg.apis.apiextensions.v1.JSON",
        "io.k8s.apiextensions-apiserver.pkg.apis.apiextensions.v1.JSONSchemaPropsOrBool",
        "io.k8s.apiextensions-apiserver.pkg.apis.apiextensions.v1.JSONSchemaPropsOrStringArray",
        "io.k8s.apimachinery.pkg.api.resource.Quantity",
    ])
});

static INVALID_DEFAULT_SCHEMAS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    let mut set = NULLABLE_SCHEMAS.clone();
    set.insert(INT_OR_STRING);
    set
});

/// Whether a group-version belongs to the Kubernetes builtin API surface
pub fn is_builtin_group_version(gv: &GroupVersion) -> bool {
    gv.group.is_empty()
        || gv.group.ends_with(".k8s.io")
        || matches!(gv.group.as_str(), "apps" | "autoscaling" | "batch" | "policy")
}

/// One entry of the ordered patch list
pub struct SchemaPatch {
    pub slug: &'static str,
    pub description: &'static str,

    /// Inclusive minor-version range; 0 means unbounded on that side
    pub min_minor_version: u32,
    pub max_minor_version: u32,

    /// None is wildcard
    pub applies_to_gv: Option<fn(&GroupVersion) -> bool>,
    pub applies_to_definition: Option<fn(&str) -> bool>,

    pub transform: fn(&VisitContext, Schema) -> Schema,
}

impl SchemaPatch {
    fn applies(&self, minor: u32, gv: &GroupVersion, def_name: &str) -> bool {
        if self.min_minor_version != 0 && self.min_minor_version > minor {
            return false;
        }
        if self.max_minor_version != 0 && self.max_minor_version < minor {
            return false;
        }
        if let Some(gv_filter) = self.applies_to_gv {
            if !gv_filter(gv) {
                return false;
            }
        }
        if let Some(def_filter) = self.applies_to_definition {
            if !def_filter(def_name) {
                return false;
            }
        }
        true
    }
}

fn in_nullable_set(def_name: &str) -> bool {
    NULLABLE_SCHEMAS.contains(def_name)
}

fn is_int_or_string_definition(def_name: &str) -> bool {
    def_name == INT_OR_STRING
}

/// Native byte-format strings may be empty; CRD validation of `byte` does
/// not allow that. Clear the format and guard with "byte or empty".
fn allow_empty_byte_format(_ctx: &VisitContext, mut schema: Schema) -> Schema {
    if schema.format.as_deref() != Some("byte") || schema.type_name() != Some("string") {
        return schema;
    }

    let byte = Schema {
        format: schema.format.take(),
        ..Default::default()
    };
    let empty = Schema {
        max_length: Some(0),
        ..Default::default()
    };
    schema.all_of.push(Schema {
        any_of: vec![byte, empty],
        ..Default::default()
    });
    schema
}

fn annotate_nullable(_ctx: &VisitContext, mut schema: Schema) -> Schema {
    schema.nullable = true;
    schema
}

/// Replace the IntOrString definition outright; only the extension matters
/// and `oneOf` with typed members is rejected by the structural converter.
fn int_or_string_definition(ctx: &VisitContext, schema: Schema) -> Schema {
    if !ctx.is_root() {
        return schema;
    }

    let mut replacement = Schema::default();
    replacement
        .extensions
        .insert("x-kubernetes-int-or-string", true);
    replacement
}

/// Some native schemas spell IntOrString as `oneOf: [string, integer]`;
/// rewrite to the extension the structural pipeline recognizes.
fn int_or_string_supplement(_ctx: &VisitContext, mut schema: Schema) -> Schema {
    if schema.extensions.get_bool("x-kubernetes-int-or-string") == Some(true) {
        return schema;
    }

    if !schema.schema_type.is_empty() || schema.one_of.len() != 2 {
        return schema;
    }

    let types: BTreeSet<&str> = schema
        .one_of
        .iter()
        .filter_map(Schema::type_name)
        .collect();
    if types.len() == 2 && types.contains("string") && types.contains("integer") {
        schema
            .extensions
            .insert("x-kubernetes-int-or-string", true);
        schema.one_of.clear();
    }
    schema
}

/// Kubernetes publishes a `{}` default for any struct type, which is
/// meaningless on types with custom marshalling.
fn remove_invalid_defaults(_ctx: &VisitContext, mut schema: Schema) -> Schema {
    let is_empty_map = matches!(&schema.default, Some(Value::Object(map)) if map.is_empty());
    if !is_empty_map {
        return schema;
    }

    let mut should_patch = schema
        .reference_name()
        .is_some_and(|name| INVALID_DEFAULT_SCHEMAS.contains(name));
    if !should_patch {
        should_patch = schema.all_of.iter().any(|member| {
            member
                .reference_name()
                .is_some_and(|name| INVALID_DEFAULT_SCHEMAS.contains(name))
        });
    }

    if should_patch {
        schema.default = None;
    }
    schema
}

fn strip_unsupported_formats(_ctx: &VisitContext, mut schema: Schema) -> Schema {
    if let Some(format) = schema.format.as_deref() {
        if !is_supported_format(format) {
            schema.format = None;
        }
    }
    schema
}

static SCHEMA_PATCHES: &[SchemaPatch] = &[
    SchemaPatch {
        slug: "AllowEmptyByteFormat",
        description: "Native types allow empty byte-format strings, CRD validation does not",
        min_minor_version: 0,
        max_minor_version: 0,
        applies_to_gv: Some(is_builtin_group_version),
        applies_to_definition: None,
        transform: allow_empty_byte_format,
    },
    SchemaPatch {
        slug: "AnnotateNullable",
        description: "Published definitions of custom-marshalled types do not allow null, the apiserver does",
        min_minor_version: 0,
        max_minor_version: 0,
        applies_to_gv: None,
        applies_to_definition: Some(in_nullable_set),
        transform: annotate_nullable,
    },
    SchemaPatch {
        slug: "IntOrStringDefinition",
        description: "Replace the IntOrString definition with its extension form",
        min_minor_version: 0,
        max_minor_version: 0,
        applies_to_gv: None,
        applies_to_definition: Some(is_int_or_string_definition),
        transform: int_or_string_definition,
    },
    SchemaPatch {
        slug: "IntOrStringSupplement",
        description: "Rewrite oneOf [string, integer] into x-kubernetes-int-or-string",
        min_minor_version: 0,
        max_minor_version: 0,
        applies_to_gv: None,
        applies_to_definition: None,
        transform: int_or_string_supplement,
    },
    SchemaPatch {
        slug: "RemoveInvalidDefaults",
        description: "Drop {} defaults on references to custom-marshalled types",
        min_minor_version: 0,
        max_minor_version: 0,
        applies_to_gv: None,
        applies_to_definition: None,
        transform: remove_invalid_defaults,
    },
    SchemaPatch {
        slug: "StripUnsupportedFormats",
        description: "Remove format values the validator does not understand",
        min_minor_version: 0,
        max_minor_version: 0,
        applies_to_gv: None,
        applies_to_definition: None,
        transform: strip_unsupported_formats,
    },
];

/// Apply every applicable patch, in declaration order, to one definition
pub fn apply_schema_patches(
    minor: u32,
    gv: &GroupVersion,
    def_name: &str,
    schema: Schema,
) -> Schema {
    let mut schema = schema;
    for patch in SCHEMA_PATCHES {
        if !patch.applies(minor, gv, def_name) {
            continue;
        }
        schema = visit_schema(def_name, schema, &mut Postorder(|ctx: &VisitContext, s| {
            Some((patch.transform)(ctx, s))
        }))
        .unwrap_or_default();
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn core_v1() -> GroupVersion {
        GroupVersion::new("", "v1")
    }

    #[test]
    fn test_builtin_group_predicate() {
        assert!(is_builtin_group_version(&GroupVersion::new("", "v1")));
        assert!(is_builtin_group_version(&GroupVersion::new("apps", "v1")));
        assert!(is_builtin_group_version(&GroupVersion::new(
            "rbac.authorization.k8s.io",
            "v1"
        )));
        assert!(!is_builtin_group_version(&GroupVersion::new(
            "cert-manager.io",
            "v1"
        )));
    }

    #[test]
    fn test_allow_empty_byte_format() {
        let schema: Schema =
            serde_json::from_value(json!({"type": "string", "format": "byte"})).unwrap();
        let patched = apply_schema_patches(0, &core_v1(), "io.k8s.api.core.v1.Whatever", schema);

        assert!(patched.format.is_none());
        assert_eq!(patched.all_of.len(), 1);
        let guard = &patched.all_of[0];
        assert_eq!(guard.any_of.len(), 2);
        assert_eq!(guard.any_of[0].format.as_deref(), Some("byte"));
        assert_eq!(guard.any_of[1].max_length, Some(0));
    }

    #[test]
    fn test_byte_format_untouched_for_crd_groups() {
        let schema: Schema =
            serde_json::from_value(json!({"type": "string", "format": "byte"})).unwrap();
        let gv = GroupVersion::new("cert-manager.io", "v1");
        let patched = apply_schema_patches(0, &gv, "some.custom.Type", schema);

        assert_eq!(patched.format.as_deref(), Some("byte"));
        assert!(patched.all_of.is_empty());
    }

    #[test]
    fn test_annotate_nullable() {
        let schema: Schema = serde_json::from_value(json!({"type": "string"})).unwrap();
        let patched = apply_schema_patches(
            0,
            &core_v1(),
            "io.k8s.apimachinery.pkg.apis.meta.v1.Time",
            schema,
        );
        assert!(patched.nullable);
    }

    #[test]
    fn test_int_or_string_definition_replaced() {
        let schema: Schema = serde_json::from_value(json!({
            "oneOf": [{"type": "string"}, {"type": "integer"}],
            "description": "IntOrString is a type that can hold an int32 or a string."
        }))
        .unwrap();
        let patched = apply_schema_patches(0, &core_v1(), INT_OR_STRING, schema);

        assert_eq!(
            patched.extensions.get_bool("x-kubernetes-int-or-string"),
            Some(true)
        );
        assert!(patched.one_of.is_empty());
        assert!(patched.description.is_none());
    }

    #[test]
    fn test_int_or_string_supplement() {
        let schema: Schema = serde_json::from_value(json!({
            "properties": {
                "port": {"oneOf": [{"type": "string"}, {"type": "integer"}]}
            }
        }))
        .unwrap();
        let patched = apply_schema_patches(0, &core_v1(), "io.k8s.api.core.v1.Probe", schema);

        let port = &patched.properties["port"];
        assert_eq!(
            port.extensions.get_bool("x-kubernetes-int-or-string"),
            Some(true)
        );
        assert!(port.one_of.is_empty());
    }

    #[test]
    fn test_one_of_with_other_types_untouched() {
        let schema: Schema = serde_json::from_value(json!({
            "oneOf": [{"type": "string"}, {"type": "boolean"}]
        }))
        .unwrap();
        let patched = apply_schema_patches(0, &core_v1(), "io.k8s.api.core.v1.Thing", schema);

        assert_eq!(patched.one_of.len(), 2);
        assert!(patched
            .extensions
            .get_bool("x-kubernetes-int-or-string")
            .is_none());
    }

    #[test]
    fn test_remove_invalid_defaults() {
        let schema: Schema = serde_json::from_value(json!({
            "properties": {
                "creationTimestamp": {
                    "default": {},
                    "allOf": [{"$ref": "#/components/schemas/io.k8s.apimachinery.pkg.apis.meta.v1.Time"}]
                },
                "spec": {
                    "default": {},
                    "allOf": [{"$ref": "#/components/schemas/io.k8s.api.core.v1.PodSpec"}]
                }
            }
        }))
        .unwrap();
        let patched = apply_schema_patches(0, &core_v1(), "io.k8s.api.core.v1.Pod", schema);

        assert!(patched.properties["creationTimestamp"].default.is_none());
        // Plain struct references keep their default
        assert_eq!(patched.properties["spec"].default, Some(json!({})));
    }

    #[test]
    fn test_strip_unsupported_formats() {
        let schema: Schema = serde_json::from_value(json!({
            "properties": {
                "quantity": {"type": "string", "format": "quantity"},
                "when": {"type": "string", "format": "date-time"}
            }
        }))
        .unwrap();
        let patched = apply_schema_patches(0, &core_v1(), "io.k8s.api.core.v1.Thing", schema);

        assert!(patched.properties["quantity"].format.is_none());
        assert_eq!(
            patched.properties["when"].format.as_deref(),
            Some("date-time")
        );
    }

    #[test]
    fn test_patches_are_idempotent() {
        let schema: Schema = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "data": {"type": "string", "format": "byte"},
                "port": {"oneOf": [{"type": "string"}, {"type": "integer"}]},
                "when": {"type": "string", "format": "quantity"}
            }
        }))
        .unwrap();

        let once = apply_schema_patches(0, &core_v1(), "io.k8s.api.core.v1.Thing", schema);
        let twice = apply_schema_patches(0, &core_v1(), "io.k8s.api.core.v1.Thing", once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_version_range_filter() {
        let patch = SchemaPatch {
            slug: "test",
            description: "",
            min_minor_version: 27,
            max_minor_version: 29,
            applies_to_gv: None,
            applies_to_definition: None,
            transform: annotate_nullable,
        };

        assert!(!patch.applies(26, &core_v1(), "x"));
        assert!(patch.applies(28, &core_v1(), "x"));
        assert!(!patch.applies(30, &core_v1(), "x"));
    }
}
