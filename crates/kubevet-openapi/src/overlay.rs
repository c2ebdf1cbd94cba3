//! Schema overlays
//!
//! Wraps a delegate source and applies a JSON merge patch (RFC 7396) to each
//! group-version document it serves. Patches are looked up by the gv path
//! key as `<dir>/<gvPath>.json|yaml|yml`; an absent patch means byte-exact
//! passthrough for that path.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, SourceError};
use crate::fs::SchemaFs;
use crate::source::{SchemaFetcher, SchemaSource, SourceMap, require_json};

/// Looks up the merge patch for a group-version path
#[derive(Clone)]
pub struct PatchLoader {
    fs: Arc<dyn SchemaFs>,
    dir: String,
}

impl PatchLoader {
    pub fn new(fs: Arc<dyn SchemaFs>, dir: impl Into<String>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    /// The hardcoded patches embedded for a builtin schema version
    pub fn builtin(version: &str) -> Self {
        static PATCHES: include_dir::Dir<'static> =
            include_dir::include_dir!("$CARGO_MANIFEST_DIR/patches");
        Self::new(
            Arc::new(crate::fs::EmbeddedFs::new(&PATCHES)),
            version.to_string(),
        )
    }

    pub fn load(&self, gv_path: &str) -> Option<Vec<u8>> {
        let base = if self.dir.is_empty() {
            gv_path.to_string()
        } else {
            format!("{}/{}", self.dir, gv_path)
        };
        for extension in ["json", "yaml", "yml"] {
            if let Ok(bytes) = self.fs.read(&format!("{base}.{extension}")) {
                return Some(bytes);
            }
        }
        None
    }
}

pub struct OverlaySource {
    patch_loader: Option<PatchLoader>,
    delegate: Arc<dyn SchemaSource>,
}

impl OverlaySource {
    pub fn new(patch_loader: Option<PatchLoader>, delegate: Arc<dyn SchemaSource>) -> Self {
        Self {
            patch_loader,
            delegate,
        }
    }
}

impl SchemaSource for OverlaySource {
    fn enumerate(&self) -> Result<SourceMap> {
        let delegated = self.delegate.enumerate()?;
        let Some(patch_loader) = &self.patch_loader else {
            return Ok(delegated);
        };

        Ok(delegated
            .into_iter()
            .map(|(path, delegate)| {
                let fetcher: Arc<dyn SchemaFetcher> = Arc::new(OverlayFetcher {
                    delegate,
                    patch_loader: patch_loader.clone(),
                    path: path.clone(),
                });
                (path, fetcher)
            })
            .collect())
    }
}

struct OverlayFetcher {
    delegate: Arc<dyn SchemaFetcher>,
    patch_loader: PatchLoader,
    path: String,
}

impl SchemaFetcher for OverlayFetcher {
    fn fetch(&self, content_type: &str) -> Result<Vec<u8>> {
        let Some(patch_bytes) = self.patch_loader.load(&self.path) else {
            return self.delegate.fetch(content_type);
        };

        require_json(content_type)?;
        let delegated = self.delegate.fetch(content_type)?;

        let mut document: Value =
            serde_json::from_slice(&delegated).map_err(|e| SourceError::BadPatch {
                path: self.path.clone(),
                message: format!("delegate document is not JSON: {e}"),
            })?;
        let patch: Value = parse_patch(&patch_bytes).map_err(|message| SourceError::BadPatch {
            path: self.path.clone(),
            message,
        })?;

        json_patch::merge(&mut document, &patch);
        Ok(serde_json::to_vec(&document)?)
    }
}

fn parse_patch(bytes: &[u8]) -> std::result::Result<Value, String> {
    if let Ok(value) = serde_json::from_slice(bytes) {
        return Ok(value);
    }
    serde_yaml::from_slice(bytes).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;
    use crate::source::DocumentFetcher;
    use kubevet_schema::Document;
    use serde_json::json;

    struct FixedSource(SourceMap);

    impl SchemaSource for FixedSource {
        fn enumerate(&self) -> Result<SourceMap> {
            Ok(self.0.clone())
        }
    }

    fn delegate() -> Arc<dyn SchemaSource> {
        let document: Document = serde_json::from_value(json!({
            "components": {"schemas": {"a.v1.A": {"type": "object"}}}
        }))
        .unwrap();
        let mut map = SourceMap::new();
        map.insert(
            "apis/apps/v1".to_string(),
            Arc::new(DocumentFetcher::new(document)) as Arc<dyn SchemaFetcher>,
        );
        Arc::new(FixedSource(map))
    }

    #[test]
    fn test_absent_patch_is_passthrough() {
        let fs = MemFs::new();
        let overlay = OverlaySource::new(Some(PatchLoader::new(Arc::new(fs), "")), delegate());

        let map = overlay.enumerate().unwrap();
        let raw = delegate().enumerate().unwrap()["apis/apps/v1"]
            .fetch("application/json")
            .unwrap();
        let overlaid = map["apis/apps/v1"].fetch("application/json").unwrap();
        assert_eq!(raw, overlaid);
    }

    #[test]
    fn test_no_loader_is_passthrough() {
        let overlay = OverlaySource::new(None, delegate());
        assert!(overlay.enumerate().unwrap().contains_key("apis/apps/v1"));
    }

    #[test]
    fn test_merge_patch_applied() {
        let mut fs = MemFs::new();
        fs.insert(
            "apis/apps/v1.json",
            json!({
                "components": {"schemas": {"a.v1.A": {"description": "patched"}}}
            })
            .to_string(),
        );
        let overlay = OverlaySource::new(Some(PatchLoader::new(Arc::new(fs), "")), delegate());

        let map = overlay.enumerate().unwrap();
        let bytes = map["apis/apps/v1"].fetch("application/json").unwrap();
        let schemas = Document::from_json(&bytes).unwrap().schemas();

        let patched = &schemas["a.v1.A"];
        assert_eq!(patched.description.as_deref(), Some("patched"));
        // merge patch preserves what it does not mention
        assert_eq!(patched.type_name(), Some("object"));
    }

    #[test]
    fn test_yaml_patch_and_null_removal() {
        let mut fs = MemFs::new();
        fs.insert(
            "apis/apps/v1.yaml",
            "components:\n  schemas:\n    a.v1.A: null\n",
        );
        let overlay = OverlaySource::new(Some(PatchLoader::new(Arc::new(fs), "")), delegate());

        let map = overlay.enumerate().unwrap();
        let bytes = map["apis/apps/v1"].fetch("application/json").unwrap();
        let schemas = Document::from_json(&bytes).unwrap().schemas();
        assert!(!schemas.contains_key("a.v1.A"));
    }

    #[test]
    fn test_malformed_patch_is_bad_request() {
        let mut fs = MemFs::new();
        fs.insert("apis/apps/v1.json", ": not json or yaml {{{");
        let overlay = OverlaySource::new(Some(PatchLoader::new(Arc::new(fs), "")), delegate());

        let map = overlay.enumerate().unwrap();
        assert!(matches!(
            map["apis/apps/v1"].fetch("application/json"),
            Err(SourceError::BadPatch { .. })
        ));
    }

    #[test]
    fn test_patch_requires_json_content_type() {
        let mut fs = MemFs::new();
        fs.insert("apis/apps/v1.json", "{}");
        let overlay = OverlaySource::new(Some(PatchLoader::new(Arc::new(fs), "")), delegate());

        let map = overlay.enumerate().unwrap();
        assert!(matches!(
            map["apis/apps/v1"].fetch("application/yaml"),
            Err(SourceError::UnsupportedContentType)
        ));
    }

    #[test]
    fn test_versioned_patch_dir() {
        let mut fs = MemFs::new();
        fs.insert(
            "1.30/apis/apps/v1.json",
            json!({"components": {"schemas": {"a.v1.A": {"title": "t"}}}}).to_string(),
        );
        let loader = PatchLoader::new(Arc::new(fs), "1.30");
        assert!(loader.load("apis/apps/v1").is_some());
        assert!(loader.load("api/v1").is_none());
    }
}
