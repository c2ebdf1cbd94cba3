//! Kubevet Validator - admission-style manifest validation
//!
//! Consumes a schema source, builds per-GVK validators on demand, and runs
//! decoded manifests through the apiserver's admission pipeline: strict
//! decode, defaulting, pruning of unknown fields, object-meta coercion,
//! schema validation, and name validation. Errors map onto the stable
//! Status taxonomy (Success / Invalid / BadRequest / InternalError).

pub mod crd_strategy;
pub mod custom;
pub mod defaulting;
pub mod document;
pub mod error;
pub mod field;
pub mod names;
pub mod objectmeta;
pub mod pruning;
pub mod schema_validation;
pub mod status;
pub mod strategy;
pub mod validator;

pub use custom::{CustomValidator, RbacValidator, find_custom_validator};
pub use document::{validate_document, validate_file_contents};
pub use error::{ValidationError, error_to_status};
pub use field::{ErrorType, FieldError, FieldPath};
pub use status::{Status, StatusCause, StatusDetails, StatusReason};
pub use validator::{Validator, ValidatorEntry};
