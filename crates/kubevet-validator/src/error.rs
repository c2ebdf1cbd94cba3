//! Validation error tree and the mapping onto the external taxonomy
//!
//! Validation accumulates heterogeneous failures — field errors, decode
//! failures, per-item statuses from list fan-out, internal errors — into a
//! joinable tree. `error_to_status` triages the tree into exactly one
//! Status per document.

use thiserror::Error;

use crate::field::FieldError;
use crate::status::{Status, StatusCause, StatusReason};
use kubevet_schema::GroupKind;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0}")]
    Field(FieldError),

    /// The document could not be decoded at all (YAML type error,
    /// malformed JSON, duplicate keys)
    #[error("failed to unmarshal document to YAML: {}", .causes.join("; "))]
    Decode { causes: Vec<String> },

    /// A pre-shaped status, e.g. produced by list items
    #[error("{}", .status.message.as_deref().unwrap_or("validation failure"))]
    Status { status: Status },

    #[error("{0}")]
    Internal(String),

    #[error("items[{index}]: {source}")]
    ListItem {
        index: usize,
        source: Box<ValidationError>,
    },

    #[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    Join(Vec<ValidationError>),
}

impl ValidationError {
    pub fn fields(errors: Vec<FieldError>) -> Self {
        ValidationError::Join(errors.into_iter().map(ValidationError::Field).collect())
    }

    /// Join a list of errors, flattening the degenerate cases
    pub fn join(mut errors: Vec<ValidationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => Some(errors.remove(0)),
            _ => Some(ValidationError::Join(errors)),
        }
    }
}

impl From<FieldError> for ValidationError {
    fn from(err: FieldError) -> Self {
        ValidationError::Field(err)
    }
}

/// Map an optional error to the single Status for a document
pub fn error_to_status(error: Option<&ValidationError>) -> Status {
    let Some(error) = error else {
        return Status::success();
    };

    match error {
        ValidationError::Status { status } => status.clone(),
        ValidationError::Field(field_error) => {
            Status::invalid(&GroupKind::default(), "", std::slice::from_ref(field_error))
        }
        ValidationError::Decode { causes } => Status::bad_request(
            "failed to unmarshal document to YAML",
            causes
                .iter()
                .map(|message| StatusCause {
                    message: message.clone(),
                    ..Default::default()
                })
                .collect(),
        ),
        ValidationError::Internal(message) => Status::internal_error(message),
        ValidationError::ListItem { .. } => triage(std::slice::from_ref(error)),
        ValidationError::Join(errors) => triage(errors),
    }
}

/// Classify a joined collection per the aggregation rules: field errors
/// aggregate to Invalid; decode-only errors to BadRequest; statuses by their
/// strongest reason with item prefixes; anything unclassifiable is internal.
fn triage(errors: &[ValidationError]) -> Status {
    if errors.is_empty() {
        return Status::success();
    }

    let mut field_errors: Vec<FieldError> = Vec::new();
    let mut decode_causes: Vec<StatusCause> = Vec::new();
    let mut statuses: Vec<(Option<usize>, Status)> = Vec::new();
    let mut other: Vec<&ValidationError> = Vec::new();

    for error in errors {
        collect(error, None, &mut field_errors, &mut decode_causes, &mut statuses, &mut other);
    }

    if !other.is_empty() {
        let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Status::internal_error(joined.join("\n"));
    }

    if !decode_causes.is_empty() && field_errors.is_empty() && statuses.is_empty() {
        return Status::bad_request("failed to unmarshal document to YAML", decode_causes);
    }

    if !statuses.is_empty() && field_errors.is_empty() {
        let mut has_invalid = false;
        let mut has_bad_request = false;
        let mut causes = Vec::new();

        for (index, status) in &statuses {
            match status.reason {
                Some(StatusReason::Invalid) => has_invalid = true,
                Some(StatusReason::BadRequest) => has_bad_request = true,
                _ => {}
            }

            let prefix = index.map(|i| format!("items[{i}]: ")).unwrap_or_default();
            let status_causes = status
                .details
                .as_ref()
                .map(|d| d.causes.clone())
                .unwrap_or_default();
            if status_causes.is_empty() {
                if let Some(message) = &status.message {
                    causes.push(StatusCause {
                        message: format!("{prefix}{message}"),
                        ..Default::default()
                    });
                }
            } else {
                for mut cause in status_causes {
                    cause.message = format!("{prefix}{}", cause.message);
                    causes.push(cause);
                }
            }
        }

        let (reason, code) = if has_invalid {
            (StatusReason::Invalid, 422)
        } else if has_bad_request {
            (StatusReason::BadRequest, 400)
        } else {
            (StatusReason::Unknown, 500)
        };

        return Status::aggregated(
            reason,
            code,
            "validation failed for one or more list items",
            causes,
        );
    }

    Status::invalid(&GroupKind::default(), "", &field_errors)
}

fn collect<'a>(
    error: &'a ValidationError,
    item_index: Option<usize>,
    field_errors: &mut Vec<FieldError>,
    decode_causes: &mut Vec<StatusCause>,
    statuses: &mut Vec<(Option<usize>, Status)>,
    other: &mut Vec<&'a ValidationError>,
) {
    match error {
        ValidationError::Field(f) => field_errors.push(f.clone()),
        ValidationError::Decode { causes } => {
            decode_causes.extend(causes.iter().map(|message| StatusCause {
                message: message.clone(),
                ..Default::default()
            }));
        }
        ValidationError::Status { status } => statuses.push((item_index, status.clone())),
        ValidationError::ListItem { index, source } => {
            // An item error becomes a status so the prefix is preserved
            let status = error_to_status(Some(source));
            statuses.push((Some(*index), status));
        }
        ValidationError::Join(inner) => {
            for e in inner {
                collect(e, item_index, field_errors, decode_causes, statuses, other);
            }
        }
        ValidationError::Internal(_) => other.push(error),
    }
}
