//! Kubevet OpenAPI - schema sources for the validation pipeline
//!
//! A schema source enumerates group-version paths to lazy schema fetchers.
//! Concrete sources read the embedded builtin bundle, local OpenAPI file
//! trees, local CRD manifests, a live cluster's discovery endpoint, or the
//! Kubernetes release branch on a code-hosting site. Sources compose:
//! `CompositeSource` unions, `FallbackSource` picks the first that works,
//! and `OverlaySource` applies JSON merge patches per group-version.

pub mod builtins;
pub mod cluster;
pub mod composite;
pub mod error;
pub mod fallback;
pub mod fs;
pub mod local_crds;
pub mod local_schemas;
pub mod meta;
pub mod overlay;
pub mod remote;
pub mod runtime;
pub mod source;
pub mod yaml;

pub use builtins::BuiltinSource;
pub use cluster::ClusterSource;
pub use composite::CompositeSource;
pub use error::{Result, SourceError};
pub use fallback::FallbackSource;
pub use fs::{DirEntry, DirFs, EmbeddedFs, MemFs, SchemaFs};
pub use local_crds::LocalCrdSource;
pub use local_schemas::LocalSchemaSource;
pub use overlay::{OverlaySource, PatchLoader};
pub use remote::RemoteSource;
pub use source::{DocumentFetcher, FileFetcher, SchemaFetcher, SchemaSource, SourceMap};
pub use yaml::{is_empty_yaml_document, split_yaml_documents};

pub const CONTENT_TYPE_JSON: &str = "application/json";
