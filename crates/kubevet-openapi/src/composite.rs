//! Composite source
//!
//! Unions the catalogs of several sources. When the same group-version path
//! is served by more than one child, the combined fetcher concatenates
//! their schema definitions with the earliest child winning per definition
//! name. A child that fails to enumerate is tolerated as long as any child
//! succeeded.

use std::collections::BTreeMap;
use std::sync::Arc;

use kubevet_schema::{Components, Document, Schema};

use crate::error::{Result, SourceError};
use crate::source::{SchemaFetcher, SchemaSource, SourceMap, require_json};

pub struct CompositeSource {
    sources: Vec<Arc<dyn SchemaSource>>,
}

impl CompositeSource {
    pub fn new(sources: Vec<Arc<dyn SchemaSource>>) -> Self {
        Self { sources }
    }
}

impl SchemaSource for CompositeSource {
    fn enumerate(&self) -> Result<SourceMap> {
        let mut merged: BTreeMap<String, Vec<Arc<dyn SchemaFetcher>>> = BTreeMap::new();
        let mut errors = Vec::new();
        let mut any_succeeded = self.sources.is_empty();

        for source in &self.sources {
            match source.enumerate() {
                Ok(map) => {
                    any_succeeded = true;
                    for (path, fetcher) in map {
                        merged.entry(path).or_default().push(fetcher);
                    }
                }
                Err(err) => errors.push(err),
            }
        }

        if !any_succeeded {
            return Err(SourceError::Aggregate(errors));
        }

        Ok(merged
            .into_iter()
            .map(|(path, fetchers)| {
                let fetcher: Arc<dyn SchemaFetcher> = Arc::new(CompositeFetcher { fetchers });
                (path, fetcher)
            })
            .collect())
    }
}

struct CompositeFetcher {
    fetchers: Vec<Arc<dyn SchemaFetcher>>,
}

impl SchemaFetcher for CompositeFetcher {
    fn fetch(&self, content_type: &str) -> Result<Vec<u8>> {
        match self.fetchers.as_slice() {
            [] => Err(SourceError::NoFetchers),
            [only] => only.fetch(content_type),
            many => {
                require_json(content_type)?;

                let mut schemas: BTreeMap<String, Schema> = BTreeMap::new();
                for fetcher in many {
                    let bytes = fetcher.fetch(content_type)?;
                    let document = Document::from_json(&bytes)?;
                    let Some(components) = document.components else {
                        continue;
                    };
                    for (name, schema) in components.schemas {
                        schemas.entry(name).or_insert(schema);
                    }
                }

                let combined = Document {
                    components: Some(Components { schemas }),
                    paths: None,
                };
                Ok(serde_json::to_vec(&combined)?)
            }
        }
    }
}
