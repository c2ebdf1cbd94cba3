//! Structural schemas
//!
//! The canonical, reference-free schema form the apiserver uses for
//! defaulting, pruning, and object-meta coercion. Fields of the OpenAPI
//! schema are partitioned: `generic` holds what describes the value itself,
//! `extensions` the `x-kubernetes-*` family, `value_validation` everything
//! that merely constrains a value (bounds, enums, composition rendered as
//! nested validations without structure), while structure recurses through
//! `properties`, `items`, and `additional_properties`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::openapi::{Items, Schema, SchemaOrBool};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structural {
    pub generic: Generic,
    pub extensions: StructuralExtensions,
    pub value_validation: Option<Box<ValueValidation>>,
    pub properties: BTreeMap<String, Structural>,
    pub items: Option<Box<Structural>>,
    pub additional_properties: Option<Box<StructuralOrBool>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generic {
    pub schema_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralExtensions {
    pub x_preserve_unknown_fields: bool,
    pub x_embedded_resource: bool,
    pub x_int_or_string: bool,
    pub x_list_map_keys: Vec<String>,
    pub x_list_type: Option<String>,
    pub x_map_type: Option<String>,
    pub x_validations: Vec<ValidationRule>,
}

/// One `x-kubernetes-validations` rule, surfaced for a CEL engine to consume
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub rule: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub message_expression: Option<String>,
    #[serde(default)]
    pub field_path: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructuralOrBool {
    Bool(bool),
    Structural(Structural),
}

impl StructuralOrBool {
    pub fn as_structural(&self) -> Option<&Structural> {
        match self {
            StructuralOrBool::Structural(s) => Some(s),
            StructuralOrBool::Bool(_) => None,
        }
    }

    pub fn allows(&self) -> bool {
        match self {
            StructuralOrBool::Bool(b) => *b,
            StructuralOrBool::Structural(_) => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueValidation {
    pub format: Option<String>,
    pub maximum: Option<f64>,
    pub exclusive_maximum: bool,
    pub minimum: Option<f64>,
    pub exclusive_minimum: bool,
    pub multiple_of: Option<f64>,
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<String>,
    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: bool,
    pub max_properties: Option<u64>,
    pub min_properties: Option<u64>,
    pub required: Vec<String>,
    pub enum_values: Vec<Value>,
    pub all_of: Vec<NestedValueValidation>,
    pub any_of: Vec<NestedValueValidation>,
    pub one_of: Vec<NestedValueValidation>,
    pub not: Option<Box<NestedValueValidation>>,
}

/// Value validation nested under a composition branch: no child structure is
/// carried here, only further constraints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedValueValidation {
    pub validation: ValueValidation,
    pub items: Option<Box<NestedValueValidation>>,
    pub properties: BTreeMap<String, NestedValueValidation>,
}

impl Structural {
    /// Convert a reference-free schema. Equal schemas map to equal
    /// structural schemas; surviving `$ref`s and multi-entry type arrays
    /// are errors.
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        if let Some(reference) = &schema.reference {
            return Err(SchemaError::UnresolvedReference {
                reference: reference.clone(),
            });
        }
        if schema.schema_type.len() > 1 {
            return Err(SchemaError::UnsupportedTypeList {
                types: schema.schema_type.clone(),
            });
        }

        let mut structural = Structural {
            generic: generic_of(schema),
            extensions: extensions_of(schema),
            ..Default::default()
        };

        // An untyped oneOf over exactly {string, integer} is the published
        // spelling of IntOrString
        let int_or_string_lifted =
            !structural.extensions.x_int_or_string && is_int_or_string_one_of(schema);
        if int_or_string_lifted {
            structural.extensions.x_int_or_string = true;
        }

        let validation = value_validation_of(schema, int_or_string_lifted);
        if validation != ValueValidation::default() {
            structural.value_validation = Some(Box::new(validation));
        }

        if let Some(items) = &schema.items {
            let element = match items.as_ref() {
                Items::Single(inner) => Some(inner.as_ref()),
                Items::Tuple(list) => list.first(),
            };
            if let Some(element) = element {
                structural.items = Some(Box::new(Structural::from_schema(element)?));
            }
        }

        for (name, property) in &schema.properties {
            structural
                .properties
                .insert(name.clone(), Structural::from_schema(property)?);
        }

        if let Some(additional) = &schema.additional_properties {
            let converted = match additional.as_ref() {
                SchemaOrBool::Bool(b) => StructuralOrBool::Bool(*b),
                SchemaOrBool::Schema(inner) => {
                    StructuralOrBool::Structural(Structural::from_schema(inner)?)
                }
            };
            structural.additional_properties = Some(Box::new(converted));
        }

        Ok(structural)
    }

    pub fn type_name(&self) -> Option<&str> {
        self.generic.schema_type.as_deref()
    }

    pub fn is_object(&self) -> bool {
        self.type_name() == Some("object")
    }
}

fn generic_of(schema: &Schema) -> Generic {
    Generic {
        schema_type: schema.type_name().map(String::from),
        title: schema.title.clone(),
        description: schema.description.clone(),
        default: schema.default.clone(),
        nullable: schema.nullable,
    }
}

fn extensions_of(schema: &Schema) -> StructuralExtensions {
    let ext = &schema.extensions;
    let mut out = StructuralExtensions {
        x_preserve_unknown_fields: ext
            .get_bool("x-kubernetes-preserve-unknown-fields")
            .unwrap_or(false),
        x_embedded_resource: ext
            .get_bool("x-kubernetes-embedded-resource")
            .unwrap_or(false),
        x_int_or_string: ext.get_bool("x-kubernetes-int-or-string").unwrap_or(false),
        x_list_map_keys: ext
            .get_string_slice("x-kubernetes-list-map-keys")
            .unwrap_or_default(),
        x_list_type: ext.get_string("x-kubernetes-list-type").map(String::from),
        x_map_type: ext.get_string("x-kubernetes-map-type").map(String::from),
        x_validations: Vec::new(),
    };

    if let Some(raw) = ext.get("x-kubernetes-validations") {
        if let Ok(rules) = serde_json::from_value::<Vec<ValidationRule>>(raw.clone()) {
            out.x_validations = rules;
        }
    }

    out
}

fn is_int_or_string_one_of(schema: &Schema) -> bool {
    if !schema.schema_type.is_empty() || schema.one_of.len() != 2 {
        return false;
    }
    let types: std::collections::BTreeSet<&str> = schema
        .one_of
        .iter()
        .filter_map(Schema::type_name)
        .collect();
    types.len() == 2 && types.contains("string") && types.contains("integer")
}

fn value_validation_of(schema: &Schema, skip_one_of: bool) -> ValueValidation {
    ValueValidation {
        format: schema.format.clone(),
        maximum: schema.maximum.as_ref().and_then(serde_json::Number::as_f64),
        exclusive_maximum: schema.exclusive_maximum,
        minimum: schema.minimum.as_ref().and_then(serde_json::Number::as_f64),
        exclusive_minimum: schema.exclusive_minimum,
        multiple_of: schema.multiple_of.as_ref().and_then(serde_json::Number::as_f64),
        max_length: schema.max_length,
        min_length: schema.min_length,
        pattern: schema.pattern.clone(),
        max_items: schema.max_items,
        min_items: schema.min_items,
        unique_items: schema.unique_items,
        max_properties: schema.max_properties,
        min_properties: schema.min_properties,
        required: schema.required.clone(),
        enum_values: schema.enum_values.clone(),
        all_of: schema.all_of.iter().map(nested_of).collect(),
        any_of: schema.any_of.iter().map(nested_of).collect(),
        one_of: if skip_one_of {
            Vec::new()
        } else {
            schema.one_of.iter().map(nested_of).collect()
        },
        not: schema.not.as_deref().map(|n| Box::new(nested_of(n))),
    }
}

fn nested_of(schema: &Schema) -> NestedValueValidation {
    let mut nested = NestedValueValidation {
        validation: value_validation_of(schema, false),
        ..Default::default()
    };

    if let Some(items) = &schema.items {
        if let Some(element) = items.element_schema() {
            nested.items = Some(Box::new(nested_of(element)));
        }
    }

    for (name, property) in &schema.properties {
        nested.properties.insert(name.clone(), nested_of(property));
    }

    nested
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_partition() {
        let s = schema(json!({
            "type": "object",
            "description": "a widget",
            "default": {"replicas": 1},
            "required": ["replicas"],
            "minProperties": 1,
            "properties": {
                "replicas": {"type": "integer", "minimum": 0, "default": 1}
            },
            "x-kubernetes-preserve-unknown-fields": true
        }));

        let structural = Structural::from_schema(&s).unwrap();
        assert_eq!(structural.generic.schema_type.as_deref(), Some("object"));
        assert_eq!(structural.generic.description.as_deref(), Some("a widget"));
        assert_eq!(structural.generic.default, Some(json!({"replicas": 1})));
        assert!(structural.extensions.x_preserve_unknown_fields);

        let validation = structural.value_validation.as_ref().unwrap();
        assert_eq!(validation.required, vec!["replicas"]);
        assert_eq!(validation.min_properties, Some(1));

        let replicas = &structural.properties["replicas"];
        assert_eq!(replicas.generic.schema_type.as_deref(), Some("integer"));
        assert_eq!(replicas.generic.default, Some(json!(1)));
        assert_eq!(
            replicas.value_validation.as_ref().unwrap().minimum,
            Some(0.0)
        );
    }

    #[test]
    fn test_no_validation_collapses_to_none() {
        let structural = Structural::from_schema(&schema(json!({"type": "string"}))).unwrap();
        assert!(structural.value_validation.is_none());
    }

    #[test]
    fn test_ref_rejected() {
        let err = Structural::from_schema(&schema(json!({
            "$ref": "#/components/schemas/example.v1.Meta"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("unresolved reference"));
    }

    #[test]
    fn test_multi_type_rejected() {
        let err =
            Structural::from_schema(&schema(json!({"type": ["string", "null"]}))).unwrap_err();
        assert!(err.to_string().contains("type arrays"));
    }

    #[test]
    fn test_tuple_items_collapse_to_first() {
        let structural = Structural::from_schema(&schema(json!({
            "type": "array",
            "items": [{"type": "string"}, {"type": "integer"}]
        })))
        .unwrap();
        assert_eq!(
            structural.items.unwrap().generic.schema_type.as_deref(),
            Some("string")
        );
    }

    #[test]
    fn test_int_or_string_lift() {
        let structural = Structural::from_schema(&schema(json!({
            "oneOf": [{"type": "integer"}, {"type": "string"}]
        })))
        .unwrap();
        assert!(structural.extensions.x_int_or_string);
        assert!(structural.value_validation.is_none());
    }

    #[test]
    fn test_composition_rendered_as_nested_validation() {
        let structural = Structural::from_schema(&schema(json!({
            "type": "string",
            "allOf": [
                {"anyOf": [{"format": "byte"}, {"maxLength": 0}]}
            ]
        })))
        .unwrap();

        let validation = structural.value_validation.unwrap();
        assert_eq!(validation.all_of.len(), 1);
        let guard = &validation.all_of[0];
        assert_eq!(guard.validation.any_of.len(), 2);
        assert_eq!(
            guard.validation.any_of[0].validation.format.as_deref(),
            Some("byte")
        );
        assert_eq!(guard.validation.any_of[1].validation.max_length, Some(0));
    }

    #[test]
    fn test_validation_rules_surfaced() {
        let structural = Structural::from_schema(&schema(json!({
            "type": "object",
            "x-kubernetes-validations": [
                {"rule": "self.replicas <= self.maxReplicas", "message": "replicas too high"}
            ]
        })))
        .unwrap();

        assert_eq!(structural.extensions.x_validations.len(), 1);
        assert_eq!(
            structural.extensions.x_validations[0].rule,
            "self.replicas <= self.maxReplicas"
        );
    }

    #[test]
    fn test_deterministic() {
        let raw = json!({
            "type": "object",
            "properties": {
                "a": {"type": "string", "enum": ["x", "y"]},
                "b": {"type": "array", "items": {"type": "integer"}}
            }
        });
        let first = Structural::from_schema(&schema(raw.clone())).unwrap();
        let second = Structural::from_schema(&schema(raw)).unwrap();
        assert_eq!(first, second);
    }
}
