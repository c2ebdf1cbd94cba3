//! OpenAPI v3 document and schema model
//!
//! This is the subset of OpenAPI v3 the Kubernetes apiserver publishes: a
//! `components.schemas` map of named definitions plus `paths` metadata. The
//! schema entity keeps `type` in its wire form (string or array) and captures
//! every key it does not model — notably the `x-kubernetes-*` family — in an
//! extensions map.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gvk::GroupVersionKind;

/// A per-group-version OpenAPI document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<BTreeMap<String, PathItem>>,
}

impl Document {
    /// Parse a document from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// The schema definitions, empty when the document has no components
    pub fn schemas(&self) -> BTreeMap<String, Schema> {
        self.components
            .as_ref()
            .map(|c| c.schemas.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
}

/// One REST path entry; only the operations carrying GVK extensions matter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Vendor extension map (`x-...` keys, plus any key the model does not carry)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(pub BTreeMap<String, Value>);

impl Extensions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_string_slice(&self, key: &str) -> Option<Vec<String>> {
        self.0.get(key).and_then(Value::as_array).map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

/// A single OpenAPI schema node
///
/// `schema_type` mirrors the wire representation, which permits both a bare
/// string and an array of strings. Everywhere downstream only the first entry
/// is meaningful; the structural converter rejects longer arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(
        rename = "type",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_type_list",
        deserialize_with = "deserialize_type_list"
    )]
    pub schema_type: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_maximum: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_minimum: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pattern_properties: BTreeMap<String, Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaOrBool>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<Box<SchemaOrBool>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Items>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Schema {
    /// The single type of this node, when one is set
    pub fn type_name(&self) -> Option<&str> {
        self.schema_type.first().map(String::as_str)
    }

    /// The referenced definition name, stripped of its pointer prefix
    pub fn reference_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(|r| r.rsplit('/').next().unwrap_or(r))
    }

    /// The lone-`allOf` reference name, if this node uses the apiserver's
    /// ref-with-sibling-fields encoding
    pub fn all_of_reference_name(&self) -> Option<&str> {
        match self.all_of.as_slice() {
            [only] => only.reference_name(),
            _ => None,
        }
    }

    pub fn string() -> Self {
        Self {
            schema_type: vec!["string".to_string()],
            ..Default::default()
        }
    }

    pub fn integer() -> Self {
        Self {
            schema_type: vec!["integer".to_string()],
            ..Default::default()
        }
    }

    pub fn object() -> Self {
        Self {
            schema_type: vec!["object".to_string()],
            ..Default::default()
        }
    }

    pub fn reference(path: impl Into<String>) -> Self {
        Self {
            reference: Some(path.into()),
            ..Default::default()
        }
    }
}

/// `additionalProperties` / `additionalItems`: a schema or a boolean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrBool {
    Bool(bool),
    Schema(Box<Schema>),
}

impl SchemaOrBool {
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaOrBool::Schema(s) => Some(s),
            SchemaOrBool::Bool(_) => None,
        }
    }

    pub fn allows(&self) -> bool {
        match self {
            SchemaOrBool::Bool(b) => *b,
            SchemaOrBool::Schema(_) => true,
        }
    }
}

/// `items`: a single schema or the tuple form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Single(Box<Schema>),
    Tuple(Vec<Schema>),
}

impl Items {
    /// The schema validation applies to array elements: the single schema,
    /// or the first tuple entry
    pub fn element_schema(&self) -> Option<&Schema> {
        match self {
            Items::Single(s) => Some(s),
            Items::Tuple(schemas) => schemas.first(),
        }
    }
}

fn serialize_type_list<S: serde::Serializer>(
    types: &[String],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match types {
        [single] => serializer.serialize_str(single),
        many => many.serialize(serializer),
    }
}

fn deserialize_type_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => Ok(vec![s]),
        StringOrList::Many(list) => {
            if list.iter().any(|t| t.is_empty()) {
                return Err(de::Error::custom("empty entry in type array"));
            }
            Ok(list)
        }
    }
}

/// Read `x-kubernetes-group-version-kind` from an extension map. The value is
/// published as a list of `{group, version, kind}` objects, but a single
/// object form also appears in the wild.
pub fn gvks_from_extensions(extensions: &Extensions) -> Vec<GroupVersionKind> {
    let Some(raw) = extensions.get("x-kubernetes-group-version-kind") else {
        return Vec::new();
    };

    let entries: Vec<&Value> = match raw {
        Value::Array(list) => list.iter().collect(),
        Value::Object(_) => vec![raw],
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            Some(GroupVersionKind::new(
                obj.get("group")?.as_str()?,
                obj.get("version")?.as_str()?,
                obj.get("kind")?.as_str()?,
            ))
        })
        .collect()
}

/// Aggregate the GVK extensions across every operation of a path entry
pub fn gvks_from_path_item(path: &PathItem) -> Vec<GroupVersionKind> {
    [&path.get, &path.put, &path.post, &path.delete]
        .into_iter()
        .flatten()
        .flat_map(|op| gvks_from_extensions(&op.extensions))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_roundtrip() {
        let raw = json!({
            "type": "object",
            "required": ["spec"],
            "properties": {
                "spec": {
                    "type": "object",
                    "properties": {
                        "replicas": {"type": "integer", "format": "int32", "minimum": 0}
                    }
                }
            },
            "x-kubernetes-group-version-kind": [
                {"group": "apps", "version": "v1", "kind": "Deployment"}
            ]
        });

        let schema: Schema = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(schema.type_name(), Some("object"));
        assert_eq!(schema.required, vec!["spec"]);

        let spec = &schema.properties["spec"];
        let replicas = &spec.properties["replicas"];
        assert_eq!(replicas.type_name(), Some("integer"));
        assert_eq!(replicas.format.as_deref(), Some("int32"));
        assert_eq!(replicas.minimum, Some(serde_json::Number::from(0)));

        let back = serde_json::to_value(&schema).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_type_array_accepted() {
        let schema: Schema = serde_json::from_value(json!({"type": ["string", "null"]})).unwrap();
        assert_eq!(schema.schema_type, vec!["string", "null"]);
    }

    #[test]
    fn test_reference_name() {
        let schema = Schema::reference("#/components/schemas/io.k8s.api.core.v1.ConfigMap");
        assert_eq!(
            schema.reference_name(),
            Some("io.k8s.api.core.v1.ConfigMap")
        );
    }

    #[test]
    fn test_lone_all_of_reference() {
        let schema: Schema = serde_json::from_value(json!({
            "description": "standard object metadata",
            "allOf": [{"$ref": "#/components/schemas/io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta"}]
        }))
        .unwrap();
        assert_eq!(
            schema.all_of_reference_name(),
            Some("io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta")
        );
    }

    #[test]
    fn test_additional_properties_forms() {
        let bool_form: Schema =
            serde_json::from_value(json!({"additionalProperties": false})).unwrap();
        assert!(!bool_form.additional_properties.unwrap().allows());

        let schema_form: Schema =
            serde_json::from_value(json!({"additionalProperties": {"type": "string"}})).unwrap();
        assert_eq!(
            schema_form
                .additional_properties
                .unwrap()
                .as_schema()
                .unwrap()
                .type_name(),
            Some("string")
        );
    }

    #[test]
    fn test_items_forms() {
        let single: Schema = serde_json::from_value(json!({"items": {"type": "string"}})).unwrap();
        assert_eq!(
            single.items.unwrap().element_schema().unwrap().type_name(),
            Some("string")
        );

        let tuple: Schema =
            serde_json::from_value(json!({"items": [{"type": "string"}, {"type": "integer"}]}))
                .unwrap();
        assert_eq!(
            tuple.items.unwrap().element_schema().unwrap().type_name(),
            Some("string")
        );
    }

    #[test]
    fn test_gvks_from_extensions_list_and_object() {
        let mut list_ext = Extensions::default();
        list_ext.insert(
            "x-kubernetes-group-version-kind",
            json!([{"group": "", "version": "v1", "kind": "ConfigMap"}]),
        );
        let gvks = gvks_from_extensions(&list_ext);
        assert_eq!(gvks, vec![GroupVersionKind::new("", "v1", "ConfigMap")]);

        let mut obj_ext = Extensions::default();
        obj_ext.insert(
            "x-kubernetes-group-version-kind",
            json!({"group": "apps", "version": "v1", "kind": "Deployment"}),
        );
        let gvks = gvks_from_extensions(&obj_ext);
        assert_eq!(gvks, vec![GroupVersionKind::new("apps", "v1", "Deployment")]);
    }

    #[test]
    fn test_document_without_components() {
        let doc = Document::from_json(br#"{"paths": {}}"#).unwrap();
        assert!(doc.schemas().is_empty());
    }
}
