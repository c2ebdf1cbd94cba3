//! Schema source and fetcher contracts
//!
//! A source enumerates the group-version paths it can serve; fetching is
//! lazy and happens per group-version when the validator first needs it.
//! Only the `application/json` content type must be supported.

use std::collections::BTreeMap;
use std::sync::Arc;

use kubevet_schema::Document;

use crate::error::{Result, SourceError};
use crate::fs::SchemaFs;
use crate::CONTENT_TYPE_JSON;

/// The per-group-version catalog a source produces
pub type SourceMap = BTreeMap<String, Arc<dyn SchemaFetcher>>;

/// Lazy producer of one group-version's OpenAPI document
pub trait SchemaFetcher: Send + Sync {
    fn fetch(&self, content_type: &str) -> Result<Vec<u8>>;
}

/// Uniform interface over every schema origin
pub trait SchemaSource: Send + Sync {
    fn enumerate(&self) -> Result<SourceMap>;
}

pub(crate) fn require_json(content_type: &str) -> Result<()> {
    if content_type.eq_ignore_ascii_case(CONTENT_TYPE_JSON) {
        Ok(())
    } else {
        Err(SourceError::UnsupportedContentType)
    }
}

/// Serves a single file through a [`SchemaFs`]
pub struct FileFetcher {
    fs: Arc<dyn SchemaFs>,
    path: String,
}

impl FileFetcher {
    pub fn new(fs: Arc<dyn SchemaFs>, path: impl Into<String>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }
}

impl SchemaFetcher for FileFetcher {
    fn fetch(&self, content_type: &str) -> Result<Vec<u8>> {
        require_json(content_type)?;
        self.fs.read(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Serves an in-memory document, serialized on demand
pub struct DocumentFetcher {
    document: Document,
}

impl DocumentFetcher {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl SchemaFetcher for DocumentFetcher {
    fn fetch(&self, content_type: &str) -> Result<Vec<u8>> {
        require_json(content_type)?;
        Ok(serde_json::to_vec(&self.document)?)
    }
}
