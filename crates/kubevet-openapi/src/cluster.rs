//! Cluster discovery source
//!
//! Talks to a Kubernetes apiserver through its OpenAPI v3 discovery
//! endpoint. Construction is free of I/O; the kubeconfig is loaded and the
//! connection opened only when the source is first enumerated, so an
//! unreachable cluster merely makes the fallback chain move on.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::runtime::block_on;
use crate::source::{SchemaFetcher, SchemaSource, SourceMap, require_json};

pub struct ClusterSource {
    client: OnceCell<kube::Client>,
}

impl Default for ClusterSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterSource {
    pub fn new() -> Self {
        Self {
            client: OnceCell::new(),
        }
    }

    fn client(&self) -> Result<&kube::Client> {
        self.client.get_or_try_init(|| {
            block_on(kube::Client::try_default())
                .map_err(|e| SourceError::Kubeconfig(e.to_string()))
        })
    }
}

/// Shape of the `/openapi/v3` discovery document
#[derive(Deserialize)]
struct DiscoveryResponse {
    paths: BTreeMap<String, DiscoveryPath>,
}

#[derive(Deserialize)]
struct DiscoveryPath {
    #[serde(rename = "serverRelativeURL")]
    server_relative_url: String,
}

impl SchemaSource for ClusterSource {
    fn enumerate(&self) -> Result<SourceMap> {
        let client = self.client()?.clone();

        let request = http::Request::get("/openapi/v3")
            .body(Vec::new())
            .map_err(|e| SourceError::Discovery(e.to_string()))?;
        let body = block_on(client.request_text(request))
            .map_err(|e| SourceError::Discovery(e.to_string()))?;

        let discovery: DiscoveryResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Discovery(e.to_string()))?;
        debug!(paths = discovery.paths.len(), "discovered cluster schema paths");

        Ok(discovery
            .paths
            .into_iter()
            .map(|(path, entry)| {
                let fetcher: Arc<dyn SchemaFetcher> = Arc::new(ClusterFetcher {
                    client: client.clone(),
                    url: entry.server_relative_url,
                });
                (path, fetcher)
            })
            .collect())
    }
}

struct ClusterFetcher {
    client: kube::Client,
    url: String,
}

impl SchemaFetcher for ClusterFetcher {
    fn fetch(&self, content_type: &str) -> Result<Vec<u8>> {
        require_json(content_type)?;

        let request = http::Request::get(self.url.as_str())
            .header(http::header::ACCEPT, content_type)
            .body(Vec::new())
            .map_err(|e| SourceError::Http {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        block_on(self.client.request_text(request))
            .map(String::into_bytes)
            .map_err(|e| SourceError::Http {
                url: self.url.clone(),
                message: e.to_string(),
            })
    }
}
