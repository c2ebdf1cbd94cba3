//! Source error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("only application/json content type is supported")]
    UnsupportedContentType,

    #[error("no builtin schemas available for version {version}")]
    UnknownBuiltinVersion { version: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing openapi document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid CRD in {path}: {message}")]
    InvalidCrd { path: String, message: String },

    #[error("bad schema patch for {path}: {message}")]
    BadPatch { path: String, message: String },

    #[error("error fetching {url}: {message}")]
    Http { url: String, message: String },

    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("failed to list cluster schemas: {0}")]
    Discovery(String),

    #[error("no schema fetchers for group-version")]
    NoFetchers,

    #[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    Aggregate(Vec<SourceError>),
}

pub type Result<T> = std::result::Result<T, SourceError>;
