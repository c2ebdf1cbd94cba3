//! Generic schema traversal
//!
//! Visits every subschema reachable through `properties`,
//! `patternProperties`, `allOf`/`anyOf`/`oneOf`, `not`, `items` (single and
//! tuple forms), `additionalProperties` and `additionalItems`. Visitors
//! rewrite by value: the replacement schema is returned, and returning
//! `None` removes the node from its parent collection. The visiting context
//! records the chain of traversed fields for diagnostic paths.

use std::collections::BTreeMap;

use crate::openapi::{Items, Schema, SchemaOrBool};

/// One step of the parent chain: which composition field was traversed, and
/// the key or index within it
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Key { field: &'static str, key: String },
    Index { field: &'static str, index: usize },
}

/// Path from the definition root down to the node being visited
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    segments: Vec<Segment>,
}

impl VisitContext {
    pub fn root(name: &str) -> Self {
        Self {
            segments: vec![Segment::Key {
                field: "schemas",
                key: name.to_string(),
            }],
        }
    }

    fn with_key(&self, field: &'static str, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key {
            field,
            key: key.to_string(),
        });
        Self { segments }
    }

    fn with_index(&self, field: &'static str, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index { field, index });
        Self { segments }
    }

    /// True for the top-level definition node itself
    pub fn is_root(&self) -> bool {
        self.segments.len() == 1
    }

    /// The definition name this visit started from
    pub fn definition(&self) -> &str {
        match &self.segments[0] {
            Segment::Key { key, .. } => key,
            Segment::Index { .. } => "",
        }
    }

    /// Dotted path below the definition root, e.g. `properties.metadata.allOf.0`
    pub fn pointer(&self) -> String {
        let mut parts = Vec::new();
        for segment in self.segments.iter().skip(1) {
            match segment {
                Segment::Key { key, .. } if key.is_empty() => {}
                Segment::Key { key, .. } => parts.push(key.clone()),
                Segment::Index { index, .. } => parts.push(index.to_string()),
            }
        }
        parts.join(".")
    }
}

/// A schema visitor; there is no "left" or "right" on this tree, so only
/// pre- and post-order hooks exist
pub trait SchemaVisitor {
    /// Called on a node before its children. Returns the (possibly replaced)
    /// node — `None` removes it — and whether to explore its subtree.
    fn visit_before(&mut self, _ctx: &VisitContext, schema: Schema) -> (Option<Schema>, bool) {
        (Some(schema), true)
    }

    /// Called on a node after its children.
    fn visit_after(&mut self, _ctx: &VisitContext, schema: Schema) -> Option<Schema> {
        Some(schema)
    }
}

/// Preorder adapter: may replace the node and decide whether to descend
pub struct Preorder<F>(pub F);

impl<F> SchemaVisitor for Preorder<F>
where
    F: FnMut(&VisitContext, Schema) -> (Option<Schema>, bool),
{
    fn visit_before(&mut self, ctx: &VisitContext, schema: Schema) -> (Option<Schema>, bool) {
        (self.0)(ctx, schema)
    }
}

/// Postorder adapter: descends first, then replaces
pub struct Postorder<F>(pub F);

impl<F> SchemaVisitor for Postorder<F>
where
    F: FnMut(&VisitContext, Schema) -> Option<Schema>,
{
    fn visit_after(&mut self, ctx: &VisitContext, schema: Schema) -> Option<Schema> {
        (self.0)(ctx, schema)
    }
}

/// Visit the definition `name`, returning the rewritten schema
pub fn visit_schema<V: SchemaVisitor>(
    name: &str,
    schema: Schema,
    visitor: &mut V,
) -> Option<Schema> {
    visit_node(&VisitContext::root(name), schema, visitor)
}

fn visit_node<V: SchemaVisitor>(
    ctx: &VisitContext,
    schema: Schema,
    visitor: &mut V,
) -> Option<Schema> {
    let (schema, descend) = visitor.visit_before(ctx, schema);
    let mut schema = schema?;

    if descend {
        let properties = std::mem::take(&mut schema.properties);
        schema.properties = visit_map(ctx, "properties", properties, visitor);

        let pattern_properties = std::mem::take(&mut schema.pattern_properties);
        schema.pattern_properties = visit_map(ctx, "patternProperties", pattern_properties, visitor);

        let all_of = std::mem::take(&mut schema.all_of);
        schema.all_of = visit_list(ctx, "allOf", all_of, visitor);

        let any_of = std::mem::take(&mut schema.any_of);
        schema.any_of = visit_list(ctx, "anyOf", any_of, visitor);

        let one_of = std::mem::take(&mut schema.one_of);
        schema.one_of = visit_list(ctx, "oneOf", one_of, visitor);

        if let Some(not) = schema.not.take() {
            schema.not = visit_node(&ctx.with_key("not", ""), *not, visitor).map(Box::new);
        }

        if let Some(items) = schema.items.take() {
            schema.items = match *items {
                Items::Single(inner) => visit_node(&ctx.with_index("items", 0), *inner, visitor)
                    .map(|s| Box::new(Items::Single(Box::new(s)))),
                Items::Tuple(list) => {
                    let visited = visit_list(ctx, "items", list, visitor);
                    Some(Box::new(Items::Tuple(visited)))
                }
            };
        }

        schema.additional_properties =
            visit_schema_or_bool(ctx, "additionalProperties", schema.additional_properties, visitor);
        schema.additional_items =
            visit_schema_or_bool(ctx, "additionalItems", schema.additional_items, visitor);
    }

    visitor.visit_after(ctx, schema)
}

fn visit_map<V: SchemaVisitor>(
    ctx: &VisitContext,
    field: &'static str,
    map: BTreeMap<String, Schema>,
    visitor: &mut V,
) -> BTreeMap<String, Schema> {
    let mut out = BTreeMap::new();
    for (key, child) in map {
        if let Some(visited) = visit_node(&ctx.with_key(field, &key), child, visitor) {
            out.insert(key, visited);
        }
    }
    out
}

fn visit_list<V: SchemaVisitor>(
    ctx: &VisitContext,
    field: &'static str,
    list: Vec<Schema>,
    visitor: &mut V,
) -> Vec<Schema> {
    list.into_iter()
        .enumerate()
        .filter_map(|(index, child)| visit_node(&ctx.with_index(field, index), child, visitor))
        .collect()
}

fn visit_schema_or_bool<V: SchemaVisitor>(
    ctx: &VisitContext,
    field: &'static str,
    value: Option<Box<SchemaOrBool>>,
    visitor: &mut V,
) -> Option<Box<SchemaOrBool>> {
    match value.map(|b| *b) {
        Some(SchemaOrBool::Schema(inner)) => {
            visit_node(&ctx.with_key(field, ""), *inner, visitor)
                .map(|s| Box::new(SchemaOrBool::Schema(Box::new(s))))
        }
        Some(SchemaOrBool::Bool(b)) => Some(Box::new(SchemaOrBool::Bool(b))),
        None => None,
    }
}
