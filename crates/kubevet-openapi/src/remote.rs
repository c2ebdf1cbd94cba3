//! Release-branch schema crawler
//!
//! Kubernetes publishes its OpenAPI v3 documents in the release branches of
//! the main repository under `api/openapi-spec/v3`, with group-versions
//! flattened into filenames:
//!
//! ```text
//! api__<version>_openapi.json
//! apis__<group>__<version>_openapi.json
//! ```
//!
//! This source lists that directory through the hosting site's contents API
//! and serves each file's download URL. Requests are subject to upstream
//! rate limits; the fallback chain only reaches here when no builtin bundle
//! matches the requested version.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::runtime::block_on;
use crate::source::{SchemaFetcher, SchemaSource, SourceMap, require_json};

const SPEC_DIR_URL: &str =
    "https://api.github.com/repos/kubernetes/kubernetes/contents/api/openapi-spec/v3";

static HTTP: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("kubevet/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("failed to build HTTP client")
});

pub struct RemoteSource {
    version: String,
}

impl RemoteSource {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(rename = "type")]
    entry_type: String,
}

impl SchemaSource for RemoteSource {
    fn enumerate(&self) -> Result<SourceMap> {
        if self.version.is_empty() {
            return Ok(SourceMap::new());
        }

        let url = format!("{SPEC_DIR_URL}?ref=release-{}", self.version);
        debug!(url = %url, "listing release schemas");

        let entries: Vec<ContentsEntry> = block_on(async {
            let response = HTTP
                .get(&url)
                .header("Accept", "application/vnd.github+json")
                .send()
                .await
                .map_err(|e| SourceError::Http {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

            if !response.status().is_success() {
                return Err(SourceError::Http {
                    url: url.clone(),
                    message: format!("status {}", response.status()),
                });
            }

            response.json().await.map_err(|e| SourceError::Http {
                url: url.clone(),
                message: e.to_string(),
            })
        })?;

        let mut result = SourceMap::new();
        for entry in entries {
            if entry.entry_type != "file" {
                continue;
            }
            let Some(gv_path) = parse_spec_filename(&entry.name) else {
                continue;
            };
            let Some(download_url) = entry.download_url else {
                continue;
            };
            result.insert(
                gv_path,
                Arc::new(HttpFetcher { url: download_url }) as Arc<dyn SchemaFetcher>,
            );
        }
        Ok(result)
    }
}

/// Parse a flattened spec filename into a group-version path key
pub fn parse_spec_filename(name: &str) -> Option<String> {
    let stem = name.strip_suffix("_openapi.json")?;

    if let Some(rest) = stem.strip_prefix("apis__") {
        let (group, version) = rest.split_once("__")?;
        if group.is_empty() || version.is_empty() {
            return None;
        }
        return Some(format!("apis/{group}/{version}"));
    }

    if let Some(version) = stem.strip_prefix("api__") {
        if version.is_empty() || version.contains("__") {
            return None;
        }
        return Some(format!("api/{version}"));
    }

    None
}

struct HttpFetcher {
    url: String,
}

impl SchemaFetcher for HttpFetcher {
    fn fetch(&self, content_type: &str) -> Result<Vec<u8>> {
        require_json(content_type)?;

        block_on(async {
            let response = HTTP
                .get(&self.url)
                .send()
                .await
                .map_err(|e| SourceError::Http {
                    url: self.url.clone(),
                    message: e.to_string(),
                })?;

            if !response.status().is_success() {
                return Err(SourceError::Http {
                    url: self.url.clone(),
                    message: format!("status {}", response.status()),
                });
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| SourceError::Http {
                    url: self.url.clone(),
                    message: e.to_string(),
                })
        })
    }
}
