//! Reference resolution
//!
//! Inlines every `$ref` indirection so downstream consumers (structural
//! conversion, schema validation) never see one. Kubernetes encodes refs two
//! ways: a direct `$ref`, and a lone-member `allOf` carrying the ref when
//! the node also sets fields like `description` or `default` (OpenAPI v3
//! forbids siblings next to `$ref`). Both are treated as indirections.
//!
//! Each top-level definition is resolved at most once; targets are inlined
//! in fully resolved form, so resolution is a memoized depth-first walk. The
//! overriding fields of the referencing node win over the referenced
//! definition. A cycle on the in-flight stack is reported as a reference
//! error; the only known cyclic input, the published CRD schema, is bypassed
//! by the validator before reaching this pass.

use std::collections::BTreeMap;

use crate::error::{Result, SchemaError};
use crate::openapi::Schema;
use crate::visitor::{Preorder, VisitContext, visit_schema};

/// Resolve every reference in a definitions map, returning the reference-free
/// equivalent. All failures are accumulated before returning.
pub fn resolve_references(definitions: &BTreeMap<String, Schema>) -> Result<BTreeMap<String, Schema>> {
    let mut resolver = Resolver {
        originals: definitions,
        resolved: BTreeMap::new(),
        in_flight: Vec::new(),
        errors: Vec::new(),
    };

    for name in definitions.keys() {
        resolver.resolve_definition(name);
    }

    if resolver.errors.is_empty() {
        Ok(resolver.resolved)
    } else {
        Err(SchemaError::References {
            messages: resolver.errors,
        })
    }
}

struct Resolver<'a> {
    originals: &'a BTreeMap<String, Schema>,
    resolved: BTreeMap<String, Schema>,
    in_flight: Vec<String>,
    errors: Vec<String>,
}

impl Resolver<'_> {
    fn resolve_definition(&mut self, name: &str) {
        if self.resolved.contains_key(name) || self.in_flight.iter().any(|n| n == name) {
            return;
        }

        let Some(original) = self.originals.get(name) else {
            return;
        };

        self.in_flight.push(name.to_string());
        let resolved = self.resolve_node(name, original.clone());
        self.in_flight.pop();
        self.resolved.insert(name.to_string(), resolved);
    }

    fn resolve_node(&mut self, def_name: &str, schema: Schema) -> Schema {
        visit_schema(
            def_name,
            schema,
            &mut Preorder(|ctx: &VisitContext, node: Schema| {
                let target = node
                    .reference_name()
                    .or_else(|| node.all_of_reference_name())
                    .map(str::to_string);
                let Some(target) = target else {
                    return (Some(node), true);
                };

                if self.in_flight.iter().any(|n| n == &target) {
                    self.errors.push(format!(
                        "reference cycle through {} in {}.{}",
                        target,
                        ctx.definition(),
                        ctx.pointer()
                    ));
                    return (Some(node), false);
                }

                self.resolve_definition(&target);
                let Some(resolved) = self.resolved.get(&target) else {
                    self.errors.push(format!(
                        "cannot resolve reference {} in {}.{}",
                        target,
                        ctx.definition(),
                        ctx.pointer()
                    ));
                    return (Some(node), true);
                };

                // The inlined target is already reference-free; no descent.
                (Some(merge_reference(resolved.clone(), &node)), false)
            }),
        )
        .unwrap_or_default()
    }
}

/// Overlay the referencing node's overriding fields onto a copy of the
/// referenced definition. Later entries override earlier ones: the copy,
/// then default, description, type, nullable (OR), then extensions per key.
fn merge_reference(target: Schema, node: &Schema) -> Schema {
    let mut merged = target;

    if node.default.is_some() {
        merged.default = node.default.clone();
    }
    if let Some(description) = &node.description {
        merged.description = Some(description.clone());
    }
    if !node.schema_type.is_empty() {
        merged.schema_type = node.schema_type.clone();
    }

    // The wire format cannot distinguish `nullable: false` from unset, and
    // no upstream schema uses a field-level nullable override, so unioning
    // is the faithful reading.
    merged.nullable = merged.nullable || node.nullable;

    for (key, value) in &node.extensions.0 {
        merged.extensions.0.insert(key.clone(), value.clone());
    }

    merged
}
