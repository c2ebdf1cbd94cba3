//! Validator catalog
//!
//! Holds the enumerated schema fetchers and a per-GVK cache of validator
//! entries. An entry is built the first time its group-version is needed:
//! the document is fetched and parsed, every definition runs through the
//! compatibility patches and the reference resolver, scope is inferred, and
//! all definitions carrying GVK extensions land in the cache (first write
//! wins). Structural schemas are derived lazily per entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::debug;

use crate::error::ValidationError;
use crate::strategy;
use kubevet_openapi::{CONTENT_TYPE_JSON, SchemaSource, SourceError, SourceMap};
use kubevet_schema::{
    Document, GroupVersionKind, ResourceScope, Schema, Structural, apply_schema_patches,
    gvks_from_extensions, infer_scope, namespaced_gvks, resolve_references,
};

pub struct ValidatorEntry {
    name: String,
    scope: ResourceScope,
    schema: Schema,
    structural: OnceCell<Arc<Structural>>,
}

impl ValidatorEntry {
    fn new(name: String, scope: ResourceScope, schema: Schema) -> Self {
        Self {
            name,
            scope,
            schema,
            structural: OnceCell::new(),
        }
    }

    /// The qualified definition name this entry validates
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_namespace_scoped(&self) -> bool {
        self.scope.is_namespaced()
    }

    pub fn preserves_unknown_fields(&self) -> bool {
        self.schema
            .extensions
            .get_bool("x-kubernetes-preserve-unknown-fields")
            .unwrap_or(false)
    }

    /// The structural schema, built once on first use
    pub fn structural(&self) -> Result<Arc<Structural>, ValidationError> {
        self.structural
            .get_or_try_init(|| {
                Structural::from_schema(&self.schema)
                    .map(Arc::new)
                    .map_err(|e| ValidationError::Internal(e.to_string()))
            })
            .cloned()
    }
}

pub struct Validator {
    fetchers: SourceMap,
    cache: Mutex<HashMap<GroupVersionKind, Arc<ValidatorEntry>>>,
}

impl Validator {
    /// Enumerate the source once and build an empty catalog over it
    pub fn new(source: &dyn SchemaSource) -> Result<Self, SourceError> {
        Ok(Self {
            fetchers: source.enumerate()?,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// The cached validator entry for a GVK, constructing the whole
    /// group-version's entries on first request
    pub fn entry_for_gvk(&self, gvk: &GroupVersionKind) -> Result<Arc<ValidatorEntry>, ValidationError> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = cache.get(gvk) {
            return Ok(entry.clone());
        }

        let gv = gvk.group_version();
        let gv_path = gv.path();
        let fetcher = self.fetchers.get(&gv_path).ok_or_else(|| {
            ValidationError::Internal(format!("failed to locate OpenAPI spec for GV: {gv}"))
        })?;

        debug!(path = %gv_path, "building validators for group-version");
        let bytes = fetcher.fetch(CONTENT_TYPE_JSON).map_err(|e| {
            ValidationError::Internal(format!("error fetching openapi at path {gv_path}: {e}"))
        })?;
        let document = Document::from_json(&bytes).map_err(|e| {
            ValidationError::Internal(format!("error parsing openapi spec: {e}"))
        })?;

        // Reconcile published schemas with apiserver behavior, then make
        // every definition reference-free.
        let patched: std::collections::BTreeMap<String, Schema> = document
            .schemas()
            .into_iter()
            .map(|(name, schema)| {
                let patched = apply_schema_patches(0, &gv, &name, schema);
                (name, patched)
            })
            .collect();
        let resolved = resolve_references(&patched)
            .map_err(|e| ValidationError::Internal(e.to_string()))?;

        let namespaced = document
            .paths
            .as_ref()
            .map(namespaced_gvks)
            .unwrap_or_default();

        for (name, schema) in &resolved {
            let gvks = gvks_from_extensions(&schema.extensions);
            if gvks.is_empty() {
                continue;
            }

            let scope = infer_scope(schema, &gvks, &namespaced);
            let entry = Arc::new(ValidatorEntry::new(name.clone(), scope, schema.clone()));
            for definition_gvk in gvks {
                cache.entry(definition_gvk).or_insert_with(|| entry.clone());
            }
        }

        cache.get(gvk).cloned().ok_or_else(|| {
            ValidationError::Internal(format!(
                "kind {} not found in {gv} groupversion",
                gvk.kind
            ))
        })
    }

    /// Decode a single document: read its GVK, strictly decode against the
    /// structural schema (unknown fields are errors unless the definition
    /// preserves them), and populate defaults.
    pub fn parse(&self, document: &[u8]) -> Result<(GroupVersionKind, Value), ValidationError> {
        let value = decode_yaml(document)?;
        self.parse_value(value)
    }

    /// Same as [`parse`](Self::parse) for an already-decoded value (list
    /// items arrive this way)
    pub fn parse_value(&self, value: Value) -> Result<(GroupVersionKind, Value), ValidationError> {
        let gvk = gvk_of(&value)?;
        let entry = self
            .entry_for_gvk(&gvk)
            .map_err(|e| ValidationError::Internal(format!("failed to retrieve validator: {e}")))?;
        let structural = entry.structural()?;

        let mut obj = value;
        let Value::Object(map) = &mut obj else {
            return Err(ValidationError::Decode {
                causes: vec!["document must be a mapping".to_string()],
            });
        };

        crate::objectmeta::fill_system_fields(map);
        let (mut unknown, meta_errors) = crate::objectmeta::coerce_object_meta(map, false);
        if !meta_errors.is_empty() {
            return Err(ValidationError::Decode {
                causes: meta_errors.iter().map(|e| e.to_string()).collect(),
            });
        }

        if !entry.preserves_unknown_fields() {
            unknown.extend(crate::pruning::prune(&mut obj, &structural, true));
        }
        crate::defaulting::prune_non_nullable_nulls_without_defaults(&mut obj, &structural);
        crate::defaulting::apply_defaults(&mut obj, &structural);

        if !unknown.is_empty() {
            let errors = unknown
                .into_iter()
                .map(|path| {
                    ValidationError::Field(crate::field::FieldError::invalid(
                        &crate::field::FieldPath::new(&path),
                        Value::Null,
                        "value provided for unknown field",
                    ))
                })
                .collect();
            return Err(ValidationError::Join(errors));
        }

        Ok((gvk, obj))
    }

    /// Validate a parsed object the way admission would on create
    pub fn validate(&self, obj: &Value) -> Result<(), ValidationError> {
        if !obj.is_object() {
            return Err(ValidationError::Internal(
                "passed object cannot be nil".to_string(),
            ));
        }

        // snapshot so defaulting never mutates caller state
        let mut work = obj.clone();
        let mut gvk = gvk_of(&work)?;
        let entry = self
            .entry_for_gvk(&gvk)
            .map_err(|e| ValidationError::Internal(format!("failed to retrieve validator: {e}")))?;

        if let Value::Object(map) = &mut work {
            if entry.is_namespace_scoped() {
                let namespace = map
                    .get("metadata")
                    .and_then(|m| m.get("namespace"))
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if namespace.is_empty() {
                    if let Some(Value::Object(metadata)) = map.get_mut("metadata") {
                        metadata.insert("namespace".to_string(), Value::String("default".to_string()));
                    }
                }
            }

            // the downstream CRD-oriented machinery expects a non-empty
            // group, so the core group travels as "core"
            if map.get("apiVersion").and_then(Value::as_str) == Some("v1") {
                gvk.group = "core".to_string();
                map.insert("apiVersion".to_string(), Value::String("core/v1".to_string()));
            }
        }

        strategy::before_create(&entry, &gvk, &mut work)
    }
}

fn decode_yaml(document: &[u8]) -> Result<Value, ValidationError> {
    serde_yaml::from_slice(document).map_err(|e| ValidationError::Decode {
        causes: vec![e.to_string()],
    })
}

fn gvk_of(value: &Value) -> Result<GroupVersionKind, ValidationError> {
    let api_version = value
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or("");
    let kind = value.get("kind").and_then(Value::as_str).unwrap_or("");

    let gvk = GroupVersionKind::from_api_version_and_kind(api_version, kind);
    if gvk.is_empty() || kind.is_empty() {
        return Err(ValidationError::Internal("GVK cannot be empty".to_string()));
    }
    Ok(gvk)
}
