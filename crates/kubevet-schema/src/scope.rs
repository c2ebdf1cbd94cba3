//! Resource scope inference
//!
//! Two signals decide whether a kind is namespaced: the REST path templates
//! of the group-version document (a template containing
//! `namespaces/{namespace}` marks its GVKs as namespaced), and the
//! `x-kubectl-validate-scope` extension stamped onto CRD-generated
//! definitions, which wins when present. With neither signal the kind is
//! treated as cluster-scoped.

use std::collections::{BTreeMap, BTreeSet};

use crate::gvk::GroupVersionKind;
use crate::openapi::{PathItem, Schema, gvks_from_path_item};

pub const SCOPE_EXTENSION: &str = "x-kubectl-validate-scope";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    Namespaced,
    Cluster,
}

impl ResourceScope {
    pub fn is_namespaced(self) -> bool {
        self == ResourceScope::Namespaced
    }
}

/// Collect every GVK that some namespaced path template serves
pub fn namespaced_gvks(paths: &BTreeMap<String, PathItem>) -> BTreeSet<GroupVersionKind> {
    let mut namespaced = BTreeSet::new();
    for (template, path_item) in paths {
        if !template.contains("namespaces/{namespace}") {
            continue;
        }
        for gvk in gvks_from_path_item(path_item) {
            namespaced.insert(gvk);
        }
    }
    namespaced
}

/// Infer the scope of one definition from its own GVKs and the namespaced
/// set, letting the scope extension override the path signal
pub fn infer_scope(
    definition: &Schema,
    definition_gvks: &[GroupVersionKind],
    namespaced: &BTreeSet<GroupVersionKind>,
) -> ResourceScope {
    let mut scoped = definition_gvks.iter().any(|gvk| namespaced.contains(gvk));

    if let Some(scope) = definition.extensions.get_string(SCOPE_EXTENSION) {
        scoped = scope.eq_ignore_ascii_case("namespaced");
    }

    if scoped {
        ResourceScope::Namespaced
    } else {
        ResourceScope::Cluster
    }
}
