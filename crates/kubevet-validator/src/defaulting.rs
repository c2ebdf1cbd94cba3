//! Structural defaulting
//!
//! Populates unset fields from the defaults declared in the structural
//! schema, the way the apiserver defaults custom resources on admission:
//! missing object properties with a default are materialized, and the walk
//! recurses through present properties, array items, and map values.

use kubevet_schema::{Structural, StructuralOrBool};
use serde_json::Value;

/// Apply schema defaults to the value, in place
pub fn apply_defaults(value: &mut Value, schema: &Structural) {
    match value {
        Value::Object(map) => {
            for (name, property) in &schema.properties {
                if !map.contains_key(name) {
                    if let Some(default) = &property.generic.default {
                        map.insert(name.clone(), default.clone());
                    }
                }
            }

            for (name, child) in map.iter_mut() {
                if let Some(property) = schema.properties.get(name) {
                    apply_defaults(child, property);
                } else if let Some(additional) = &schema.additional_properties {
                    if let StructuralOrBool::Structural(additional) = additional.as_ref() {
                        apply_defaults(child, additional);
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = &schema.items {
                for item in items {
                    apply_defaults(item, item_schema);
                }
            }
        }
        _ => {}
    }
}

/// Remove null values of non-nullable fields that carry no default; the
/// apiserver treats such nulls as "unset" rather than rejecting them
pub fn prune_non_nullable_nulls_without_defaults(value: &mut Value, schema: &Structural) {
    match value {
        Value::Object(map) => {
            map.retain(|name, child| {
                if !child.is_null() {
                    return true;
                }
                match schema.properties.get(name) {
                    Some(property) => {
                        property.generic.nullable || property.generic.default.is_some()
                    }
                    // unknown or map-typed fields are left for pruning
                    None => true,
                }
            });

            for (name, child) in map.iter_mut() {
                if let Some(property) = schema.properties.get(name) {
                    prune_non_nullable_nulls_without_defaults(child, property);
                } else if let Some(additional) = &schema.additional_properties {
                    if let StructuralOrBool::Structural(additional) = additional.as_ref() {
                        prune_non_nullable_nulls_without_defaults(child, additional);
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = &schema.items {
                for item in items {
                    prune_non_nullable_nulls_without_defaults(item, item_schema);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubevet_schema::Schema;
    use serde_json::json;

    fn structural(value: serde_json::Value) -> Structural {
        let schema: Schema = serde_json::from_value(value).unwrap();
        Structural::from_schema(&schema).unwrap()
    }

    #[test]
    fn test_missing_fields_defaulted() {
        let schema = structural(json!({
            "type": "object",
            "properties": {
                "replicas": {"type": "integer", "default": 1},
                "strategy": {
                    "type": "object",
                    "default": {"type": "RollingUpdate"},
                    "properties": {"type": {"type": "string"}}
                },
                "name": {"type": "string"}
            }
        }));

        let mut value = json!({"name": "x"});
        apply_defaults(&mut value, &schema);

        assert_eq!(value["replicas"], json!(1));
        assert_eq!(value["strategy"], json!({"type": "RollingUpdate"}));
    }

    #[test]
    fn test_present_fields_untouched() {
        let schema = structural(json!({
            "type": "object",
            "properties": {"replicas": {"type": "integer", "default": 1}}
        }));

        let mut value = json!({"replicas": 5});
        apply_defaults(&mut value, &schema);
        assert_eq!(value["replicas"], json!(5));
    }

    #[test]
    fn test_recursion_through_arrays_and_maps() {
        let schema = structural(json!({
            "type": "object",
            "properties": {
                "containers": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"pullPolicy": {"type": "string", "default": "IfNotPresent"}}
                    }
                },
                "env": {
                    "type": "object",
                    "additionalProperties": {
                        "type": "object",
                        "properties": {"optional": {"type": "boolean", "default": false}}
                    }
                }
            }
        }));

        let mut value = json!({
            "containers": [{"name": "a"}, {"pullPolicy": "Always"}],
            "env": {"first": {}}
        });
        apply_defaults(&mut value, &schema);

        assert_eq!(value["containers"][0]["pullPolicy"], json!("IfNotPresent"));
        assert_eq!(value["containers"][1]["pullPolicy"], json!("Always"));
        assert_eq!(value["env"]["first"]["optional"], json!(false));
    }

    #[test]
    fn test_null_pruning() {
        let schema = structural(json!({
            "type": "object",
            "properties": {
                "plain": {"type": "string"},
                "nullable": {"type": "string", "nullable": true},
                "defaulted": {"type": "string", "default": "d"}
            }
        }));

        let mut value = json!({"plain": null, "nullable": null, "defaulted": null});
        prune_non_nullable_nulls_without_defaults(&mut value, &schema);

        let map = value.as_object().unwrap();
        assert!(!map.contains_key("plain"));
        assert!(map.contains_key("nullable"));
        assert!(map.contains_key("defaulted"));
    }
}
