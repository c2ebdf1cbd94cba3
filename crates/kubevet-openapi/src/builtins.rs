//! Embedded builtin schemas
//!
//! Ships the downloaded OpenAPI documents for known Kubernetes minor
//! versions, one directory per version:
//!
//! ```text
//! <version>/api/<v>.json
//! <version>/apis/<group>/<v>.json
//! ```

use std::sync::Arc;

use include_dir::{Dir, include_dir};

use crate::error::{Result, SourceError};
use crate::fs::{self, EmbeddedFs, SchemaFs};
use crate::source::{FileFetcher, SchemaSource, SourceMap};

static BUILTIN_SCHEMAS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/builtins");

/// Source backed by the embedded bundle (or any tree with the same layout)
pub struct BuiltinSource {
    version: String,
    fs: Arc<dyn SchemaFs>,
}

impl BuiltinSource {
    pub fn new(version: impl Into<String>) -> Self {
        Self::with_fs(version, Arc::new(EmbeddedFs::new(&BUILTIN_SCHEMAS)))
    }

    /// Same layout served from a caller-provided tree; used by tests and by
    /// installations that maintain their own bundle
    pub fn with_fs(version: impl Into<String>, fs: Arc<dyn SchemaFs>) -> Self {
        Self {
            version: version.into(),
            fs,
        }
    }
}

impl SchemaSource for BuiltinSource {
    fn enumerate(&self) -> Result<SourceMap> {
        if self.version.is_empty() {
            return Ok(SourceMap::new());
        }

        let version_exists = self
            .fs
            .read_dir("")
            .map(|entries| entries.iter().any(|e| e.is_dir && e.name == self.version))
            .unwrap_or(false);
        if !version_exists {
            return Err(SourceError::UnknownBuiltinVersion {
                version: self.version.clone(),
            });
        }

        let mut result = SourceMap::new();

        let api_dir = format!("{}/api", self.version);
        if let Ok(entries) = self.fs.read_dir(&api_dir) {
            for entry in entries.iter().filter(|e| !e.is_dir && fs::is_json(&e.name)) {
                let version = fs::strip_extension(&entry.name);
                result.insert(
                    format!("api/{version}"),
                    Arc::new(FileFetcher::new(
                        self.fs.clone(),
                        format!("{api_dir}/{}", entry.name),
                    )),
                );
            }
        }

        let apis_dir = format!("{}/apis", self.version);
        if let Ok(groups) = self.fs.read_dir(&apis_dir) {
            for group in groups.iter().filter(|e| e.is_dir) {
                let group_dir = format!("{apis_dir}/{}", group.name);
                let versions = self.fs.read_dir(&group_dir).map_err(|source| SourceError::Io {
                    path: group_dir.clone(),
                    source,
                })?;
                for entry in versions.iter().filter(|e| !e.is_dir && fs::is_json(&e.name)) {
                    let version = fs::strip_extension(&entry.name);
                    result.insert(
                        format!("apis/{}/{version}", group.name),
                        Arc::new(FileFetcher::new(
                            self.fs.clone(),
                            format!("{group_dir}/{}", entry.name),
                        )),
                    );
                }
            }
        }

        Ok(result)
    }
}
