//! Local OpenAPI file trees
//!
//! Same on-disk layout as the builtin bundle, rooted at a user directory:
//!
//! ```text
//! <root>/api/<version>.json
//! <root>/apis/<group>/<version>.json
//! ```
//!
//! A missing `api/` or `apis/` subtree is not an error; only `.json` files
//! are considered.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Result, SourceError};
use crate::fs::{self, DirFs, SchemaFs};
use crate::source::{FileFetcher, SchemaSource, SourceMap};

pub struct LocalSchemaSource {
    root: Option<PathBuf>,
}

impl LocalSchemaSource {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

impl SchemaSource for LocalSchemaSource {
    fn enumerate(&self) -> Result<SourceMap> {
        let Some(root) = &self.root else {
            return Ok(SourceMap::new());
        };
        let tree: Arc<dyn SchemaFs> = Arc::new(DirFs::new(root));
        let mut result = SourceMap::new();

        match tree.read_dir("api") {
            Ok(entries) => {
                for entry in entries.iter().filter(|e| !e.is_dir && fs::is_json(&e.name)) {
                    let version = fs::strip_extension(&entry.name);
                    result.insert(
                        format!("api/{version}"),
                        Arc::new(FileFetcher::new(tree.clone(), format!("api/{}", entry.name))),
                    );
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(SourceError::Io {
                    path: root.join("api").display().to_string(),
                    source: err,
                });
            }
        }

        match tree.read_dir("apis") {
            Ok(groups) => {
                for group in groups.iter().filter(|e| e.is_dir) {
                    let group_dir = format!("apis/{}", group.name);
                    let versions = tree.read_dir(&group_dir).map_err(|source| SourceError::Io {
                        path: root.join(&group_dir).display().to_string(),
                        source,
                    })?;
                    for entry in versions.iter().filter(|e| !e.is_dir && fs::is_json(&e.name)) {
                        let version = fs::strip_extension(&entry.name);
                        result.insert(
                            format!("{group_dir}/{version}"),
                            Arc::new(FileFetcher::new(
                                tree.clone(),
                                format!("{group_dir}/{}", entry.name),
                            )),
                        );
                    }
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(SourceError::Io {
                    path: root.join("apis").display().to_string(),
                    source: err,
                });
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_root_is_empty() {
        let source = LocalSchemaSource::new(None);
        assert!(source.enumerate().unwrap().is_empty());
    }

    #[test]
    fn test_missing_subtrees_are_not_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let source = LocalSchemaSource::new(Some(tmp.path().to_path_buf()));
        assert!(source.enumerate().unwrap().is_empty());
    }

    #[test]
    fn test_layout_enumerated() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("api")).unwrap();
        std::fs::create_dir_all(tmp.path().join("apis/apps")).unwrap();
        std::fs::write(
            tmp.path().join("api/v1.json"),
            br#"{"components":{"schemas":{}}}"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("apis/apps/v1.json"),
            br#"{"components":{"schemas":{}}}"#,
        )
        .unwrap();
        // non-json files are ignored
        std::fs::write(tmp.path().join("api/notes.txt"), b"ignored").unwrap();

        let source = LocalSchemaSource::new(Some(tmp.path().to_path_buf()));
        let map = source.enumerate().unwrap();

        let mut keys: Vec<_> = map.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["api/v1", "apis/apps/v1"]);

        let bytes = map["apis/apps/v1"].fetch("application/json").unwrap();
        assert_eq!(bytes, br#"{"components":{"schemas":{}}}"#);
    }
}
