//! External status model
//!
//! The stable, serializable shape every validation outcome maps onto:
//! `{status, code, reason, message, details.causes[]}`, mirroring the
//! apiserver's Status object so JSON output can be consumed by existing
//! tooling.

use serde::{Deserialize, Serialize};

use crate::field::FieldError;
use kubevet_schema::GroupKind;

pub const STATUS_SUCCESS: &str = "Success";
pub const STATUS_FAILURE: &str = "Failure";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusReason {
    Invalid,
    BadRequest,
    InternalError,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<StatusReason>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub code: i32,
}

fn is_zero(code: &i32) -> bool {
    *code == 0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<StatusCause>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCause {
    /// The cause type, e.g. `FieldValueInvalid`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field: String,
}

impl Status {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
            reason: None,
            details: None,
            code: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// 422 Invalid aggregated from field errors
    pub fn invalid(group_kind: &GroupKind, name: &str, errors: &[FieldError]) -> Self {
        let causes: Vec<StatusCause> = errors
            .iter()
            .map(|e| StatusCause {
                reason: e.error_type.as_cause().to_string(),
                message: e.to_string(),
                field: e.field.clone(),
            })
            .collect();

        let message = if errors.is_empty() {
            format!("{group_kind} \"{name}\" is invalid", )
        } else {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            format!("{group_kind} \"{name}\" is invalid: [{}]", joined.join(", "))
        };

        Self {
            status: STATUS_FAILURE.to_string(),
            message: Some(message),
            reason: Some(StatusReason::Invalid),
            details: Some(StatusDetails {
                name: name.to_string(),
                group: group_kind.group.clone(),
                kind: group_kind.kind.clone(),
                causes,
            }),
            code: 422,
        }
    }

    /// 400 BadRequest with per-cause details
    pub fn bad_request(message: impl Into<String>, causes: Vec<StatusCause>) -> Self {
        Self {
            status: STATUS_FAILURE.to_string(),
            message: Some(message.into()),
            reason: Some(StatusReason::BadRequest),
            details: if causes.is_empty() {
                None
            } else {
                Some(StatusDetails {
                    causes,
                    ..Default::default()
                })
            },
            code: 400,
        }
    }

    /// 500 InternalError
    pub fn internal_error(message: impl std::fmt::Display) -> Self {
        Self {
            status: STATUS_FAILURE.to_string(),
            message: Some(format!("Internal error occurred: {message}")),
            reason: Some(StatusReason::InternalError),
            details: None,
            code: 500,
        }
    }

    /// Failure aggregated from list-item statuses
    pub fn aggregated(reason: StatusReason, code: i32, message: impl Into<String>, causes: Vec<StatusCause>) -> Self {
        Self {
            status: STATUS_FAILURE.to_string(),
            message: Some(message.into()),
            reason: Some(reason),
            details: Some(StatusDetails {
                causes,
                ..Default::default()
            }),
            code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldError, FieldPath};
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let status = Status::success();
        let rendered = serde_json::to_value(&status).unwrap();
        assert_eq!(rendered, json!({"status": "Success"}));
    }

    #[test]
    fn test_invalid_shape() {
        let gk = GroupKind {
            group: String::new(),
            kind: "ConfigMap".to_string(),
        };
        let errors = vec![FieldError::invalid(
            &FieldPath::new("metadata").child("name"),
            json!("-bad"),
            "bad name",
        )];
        let status = Status::invalid(&gk, "-bad", &errors);

        assert_eq!(status.code, 422);
        assert_eq!(status.reason, Some(StatusReason::Invalid));
        let details = status.details.unwrap();
        assert_eq!(details.causes.len(), 1);
        assert_eq!(details.causes[0].field, "metadata.name");
        assert_eq!(details.causes[0].reason, "FieldValueInvalid");
        assert!(details.causes[0].message.contains("bad name"));
    }

    #[test]
    fn test_internal_error_message() {
        let status = Status::internal_error("boom");
        assert_eq!(status.code, 500);
        assert_eq!(
            status.message.as_deref(),
            Some("Internal error occurred: boom")
        );
    }
}
