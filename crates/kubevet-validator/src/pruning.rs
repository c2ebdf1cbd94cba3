//! Structural pruning of unknown fields
//!
//! Removes object fields the structural schema does not know, the way the
//! apiserver prunes custom resources. `x-kubernetes-preserve-unknown-fields`
//! suppresses pruning at that subtree; `x-kubernetes-embedded-resource`
//! re-roots the walk so the embedded object's `apiVersion`/`kind`/
//! `metadata` survive. When tracking is enabled the pruned paths are
//! returned so strict decoding can report them.

use kubevet_schema::{Structural, StructuralOrBool};
use serde_json::Value;

use crate::field::FieldPath;

/// Prune `value` against the schema, treating it as a resource root.
/// Returns the pruned field paths when `track` is set.
pub fn prune(value: &mut Value, schema: &Structural, track: bool) -> Vec<String> {
    let mut pruned = Vec::new();
    prune_node(
        value,
        Some(schema),
        true,
        &FieldPath::root(),
        track,
        &mut pruned,
    );
    pruned
}

fn prune_node(
    value: &mut Value,
    schema: Option<&Structural>,
    is_resource_root: bool,
    path: &FieldPath,
    track: bool,
    pruned: &mut Vec<String>,
) {
    match value {
        Value::Object(map) => {
            let preserve_unknown = schema.is_none()
                || schema.is_some_and(|s| s.extensions.x_preserve_unknown_fields);

            let mut remove = Vec::new();
            for (key, child) in map.iter_mut() {
                // the implicit root fields are owned by TypeMeta/ObjectMeta,
                // not the declared schema
                if is_resource_root && matches!(key.as_str(), "apiVersion" | "kind" | "metadata") {
                    continue;
                }

                let child_path = if path.as_str().is_empty() {
                    FieldPath::new(key)
                } else {
                    path.child(key)
                };

                let property = schema.and_then(|s| s.properties.get(key));
                if let Some(property) = property {
                    let embedded = property.extensions.x_embedded_resource;
                    prune_node(child, Some(property), embedded, &child_path, track, pruned);
                    continue;
                }

                if let Some(additional) = schema.and_then(|s| s.additional_properties.as_deref()) {
                    match additional {
                        StructuralOrBool::Structural(additional) => {
                            let embedded = additional.extensions.x_embedded_resource;
                            prune_node(child, Some(additional), embedded, &child_path, track, pruned);
                        }
                        StructuralOrBool::Bool(true) => {}
                        StructuralOrBool::Bool(false) => {
                            remove.push(key.clone());
                            if track {
                                pruned.push(child_path.to_string());
                            }
                        }
                    }
                    continue;
                }

                if preserve_unknown {
                    continue;
                }

                remove.push(key.clone());
                if track {
                    pruned.push(child_path.to_string());
                }
            }

            for key in remove {
                map.remove(&key);
            }
        }
        Value::Array(items) => {
            let item_schema = schema.and_then(|s| s.items.as_deref());
            for (index, item) in items.iter_mut().enumerate() {
                let embedded = item_schema.is_some_and(|s| s.extensions.x_embedded_resource);
                prune_node(item, item_schema, embedded, &path.index(index), track, pruned);
            }
        }
        _ => {}
    }
}
