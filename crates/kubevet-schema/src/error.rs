//! Schema error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("failed to parse OpenAPI document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unresolved reference: {reference}")]
    UnresolvedReference { reference: String },

    #[error("{}", .messages.join("\n"))]
    References { messages: Vec<String> },

    #[error("type arrays with more than one entry are not supported: {types:?}")]
    UnsupportedTypeList { types: Vec<String> },

    #[error("invalid CustomResourceDefinition: {message}")]
    InvalidCrd { message: String },

    #[error("missing schema for version {version} of {name}")]
    MissingVersionSchema { name: String, version: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
