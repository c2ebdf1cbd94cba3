//! CustomResourceDefinition manifest model
//!
//! The subset of the apiextensions.k8s.io/v1 CRD type the pipeline needs:
//! enough to synthesize per-group-version OpenAPI documents from CRD files
//! and to validate CRD manifests themselves (which bypass the structural
//! path). The per-version `openAPIV3Schema` deserializes directly into the
//! OpenAPI [`Schema`](crate::openapi::Schema) model.

use serde::Deserialize;

use crate::error::{Result, SchemaError};
use crate::gvk::GroupVersionKind;
use crate::openapi::Schema;

pub const CRD_GROUP: &str = "apiextensions.k8s.io";
pub const CRD_KIND: &str = "CustomResourceDefinition";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResourceDefinition {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: CrdMetadata,
    pub spec: CrdSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrdMetadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdSpec {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub names: CrdNames,
    #[serde(default)]
    pub scope: CrdScope,
    #[serde(default)]
    pub versions: Vec<CrdVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdNames {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub plural: String,
    #[serde(default)]
    pub singular: Option<String>,
    #[serde(default)]
    pub short_names: Vec<String>,
    #[serde(default)]
    pub list_kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum CrdScope {
    #[default]
    Namespaced,
    Cluster,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for CrdScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Namespaced => write!(f, "Namespaced"),
            Self::Cluster => write!(f, "Cluster"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdVersion {
    pub name: String,
    #[serde(default = "default_true")]
    pub served: bool,
    #[serde(default)]
    pub storage: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub schema: Option<CrdVersionSchema>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdVersionSchema {
    #[serde(rename = "openAPIV3Schema")]
    pub open_api_v3_schema: Option<Schema>,
}

fn default_true() -> bool {
    true
}

impl CustomResourceDefinition {
    /// Whether a decoded document even claims to be a CRD; anything else is
    /// skipped by the local-CRD source rather than treated as an error
    pub fn is_crd_document(value: &serde_json::Value) -> bool {
        let api_version = value.get("apiVersion").and_then(|v| v.as_str()).unwrap_or("");
        let kind = value.get("kind").and_then(|v| v.as_str()).unwrap_or("");
        kind == CRD_KIND && api_version.starts_with(CRD_GROUP)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| SchemaError::InvalidCrd {
            message: e.to_string(),
        })
    }

    /// The GVK a given CRD version serves
    pub fn gvk_for_version(&self, version: &str) -> GroupVersionKind {
        GroupVersionKind::new(self.spec.group.clone(), version, self.spec.names.kind.clone())
    }

    /// The validation schema declared for a version
    pub fn schema_for_version(&self, version: &str) -> Result<Schema> {
        self.spec
            .versions
            .iter()
            .find(|v| v.name == version)
            .and_then(|v| v.schema.as_ref())
            .and_then(|s| s.open_api_v3_schema.clone())
            .ok_or_else(|| SchemaError::MissingVersionSchema {
                name: self.metadata.name.clone(),
                version: version.to_string(),
            })
    }

    /// The storage version, when exactly one is flagged
    pub fn storage_version(&self) -> Option<&CrdVersion> {
        self.spec.versions.iter().find(|v| v.storage)
    }
}
