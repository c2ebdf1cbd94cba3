//! Local CRD file trees
//!
//! Ingests `.yaml`/`.yml`/`.json` files from one or more roots. Every YAML
//! document recognized as a CustomResourceDefinition contributes one schema
//! per declared version to a synthesized OpenAPI document keyed
//! `apis/<group>/<version>`. Other kinds are skipped silently, so a CRD
//! directory may hold whole application bundles. The generated schema is
//! augmented the way the apiserver implicitly augments custom resources:
//! injected `apiVersion`/`kind`/`metadata` properties, the ObjectMeta
//! definition family, the GVK extension, and the CRD's declared scope.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use kubevet_schema::{
    Components, CustomResourceDefinition, Document, GroupVersion, Schema,
    scope::SCOPE_EXTENSION,
};
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::fs::{self, DirEntry, DirFs, SchemaFs};
use crate::meta;
use crate::source::{DocumentFetcher, SchemaSource, SourceMap};
use crate::yaml::{is_empty_yaml_document, split_yaml_documents};

pub struct LocalCrdSource {
    roots: Vec<PathBuf>,
}

impl LocalCrdSource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    fn documents_in(&self, root: &PathBuf) -> Result<Vec<(String, serde_json::Value)>> {
        let tree = DirFs::new(root);
        let entries = tree.read_dir("").map_err(|source| SourceError::Io {
            path: root.display().to_string(),
            source,
        })?;

        let mut documents = Vec::new();
        for DirEntry { name, is_dir } in entries {
            if is_dir || !(fs::is_yaml(&name) || fs::is_json(&name)) {
                continue;
            }
            let bytes = tree.read(&name).map_err(|source| SourceError::Io {
                path: root.join(&name).display().to_string(),
                source,
            })?;

            if fs::is_json(&name) {
                let value: serde_json::Value = serde_json::from_slice(&bytes)?;
                documents.push((name, value));
                continue;
            }

            for chunk in split_yaml_documents(&bytes) {
                if is_empty_yaml_document(chunk) {
                    continue;
                }
                let value: serde_json::Value =
                    serde_yaml::from_slice(chunk).map_err(|e| SourceError::InvalidCrd {
                        path: root.join(&name).display().to_string(),
                        message: e.to_string(),
                    })?;
                documents.push((name.clone(), value));
            }
        }
        Ok(documents)
    }
}

impl SchemaSource for LocalCrdSource {
    fn enumerate(&self) -> Result<SourceMap> {
        let mut per_gv: BTreeMap<GroupVersion, BTreeMap<String, Schema>> = BTreeMap::new();

        for root in &self.roots {
            for (file, value) in self.documents_in(root)? {
                if !CustomResourceDefinition::is_crd_document(&value) {
                    debug!(file = %file, "skipping non-CRD document");
                    continue;
                }
                let crd = CustomResourceDefinition::from_value(value).map_err(|e| {
                    SourceError::InvalidCrd {
                        path: file.clone(),
                        message: e.to_string(),
                    }
                })?;

                for version in &crd.spec.versions {
                    let Ok(schema) = crd.schema_for_version(&version.name) else {
                        debug!(crd = %crd.metadata.name, version = %version.name, "version has no schema");
                        continue;
                    };
                    let gvk = crd.gvk_for_version(&version.name);
                    let augmented = augment_crd_schema(schema, &crd, &gvk.version);

                    let key = format!("{}/{}.{}", gvk.group, gvk.version, gvk.kind);
                    per_gv
                        .entry(gvk.group_version())
                        .or_default()
                        .insert(key, augmented);
                }
            }
        }

        let mut result = SourceMap::new();
        for (gv, mut schemas) in per_gv {
            for (name, schema) in meta::meta_schema_definitions() {
                schemas.entry(name).or_insert(schema);
            }
            let document = Document {
                components: Some(Components { schemas }),
                paths: None,
            };
            result.insert(gv.path(), Arc::new(DocumentFetcher::new(document)));
        }
        Ok(result)
    }
}

/// Mirror the apiserver's implicit schema injection for custom resources
fn augment_crd_schema(
    mut schema: Schema,
    crd: &CustomResourceDefinition,
    version: &str,
) -> Schema {
    if schema.schema_type.is_empty() {
        schema.schema_type = vec!["object".to_string()];
    }

    for (name, property) in meta::injected_root_properties() {
        schema.properties.entry(name).or_insert(property);
    }

    let gvk = crd.gvk_for_version(version);
    schema.extensions.insert(
        "x-kubernetes-group-version-kind",
        serde_json::json!([{
            "group": gvk.group,
            "version": gvk.version,
            "kind": gvk.kind,
        }]),
    );
    schema
        .extensions
        .insert(SCOPE_EXTENSION, crd.spec.scope.to_string());

    schema
}
