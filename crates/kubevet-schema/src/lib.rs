//! Kubevet Schema - OpenAPI schema model and transformations
//!
//! This crate provides the schema half of the validation pipeline:
//! - `Schema`/`Document`: the OpenAPI v3 subset published by Kubernetes
//! - `visitor`: generic pre/post-order schema traversal
//! - `patches`: compatibility patches reconciling published schemas with
//!   apiserver behavior
//! - `refs`: `$ref` inlining
//! - `scope`: namespace vs cluster scope inference
//! - `structural`: the canonical structural schema used for defaulting,
//!   pruning, and object-meta coercion
//! - `crd`: the CustomResourceDefinition manifest model

pub mod crd;
pub mod error;
pub mod formats;
pub mod gvk;
pub mod openapi;
pub mod patches;
pub mod refs;
pub mod scope;
pub mod structural;
pub mod visitor;

pub use crd::{CrdNames, CrdScope, CrdVersion, CustomResourceDefinition};
pub use error::{Result, SchemaError};
pub use gvk::{GroupKind, GroupVersion, GroupVersionKind};
pub use openapi::{
    Components, Document, Extensions, Items, Operation, PathItem, Schema, SchemaOrBool,
    gvks_from_extensions, gvks_from_path_item,
};
pub use patches::{SchemaPatch, apply_schema_patches, is_builtin_group_version};
pub use refs::resolve_references;
pub use scope::{ResourceScope, infer_scope, namespaced_gvks};
pub use structural::{
    Generic, Structural, StructuralExtensions, StructuralOrBool, ValidationRule, ValueValidation,
};
pub use visitor::{Postorder, Preorder, SchemaVisitor, VisitContext, visit_schema};
