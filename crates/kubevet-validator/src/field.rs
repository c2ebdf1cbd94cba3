//! Field-level validation errors
//!
//! The internal currency of validation: a typed error anchored to a dotted
//! field path, rendered the way the apiserver renders its field errors so
//! messages line up with what `kubectl apply` would print.

use serde_json::Value;

/// Builder for dotted, indexed field paths (`spec.containers[0].name`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{}]", self.0, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    NotFound,
    Required,
    Duplicate,
    Invalid,
    NotSupported,
    Forbidden,
    TooLong,
    TooMany,
    InternalError,
    TypeInvalid,
}

impl ErrorType {
    /// The machine-readable cause string used in Status causes
    pub fn as_cause(&self) -> &'static str {
        match self {
            ErrorType::NotFound => "FieldValueNotFound",
            ErrorType::Required => "FieldValueRequired",
            ErrorType::Duplicate => "FieldValueDuplicate",
            ErrorType::Invalid => "FieldValueInvalid",
            ErrorType::NotSupported => "FieldValueNotSupported",
            ErrorType::Forbidden => "FieldValueForbidden",
            ErrorType::TooLong => "FieldValueTooLong",
            ErrorType::TooMany => "FieldValueTooMany",
            ErrorType::InternalError => "InternalError",
            ErrorType::TypeInvalid => "FieldValueTypeInvalid",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ErrorType::NotFound => "Not found",
            ErrorType::Required => "Required value",
            ErrorType::Duplicate => "Duplicate value",
            ErrorType::Invalid => "Invalid value",
            ErrorType::NotSupported => "Unsupported value",
            ErrorType::Forbidden => "Forbidden",
            ErrorType::TooLong => "Too long",
            ErrorType::TooMany => "Too many",
            ErrorType::InternalError => "Internal error",
            ErrorType::TypeInvalid => "Invalid value",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub error_type: ErrorType,
    pub field: String,
    pub bad_value: Value,
    pub detail: String,
}

impl FieldError {
    pub fn invalid(path: &FieldPath, bad_value: Value, detail: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::Invalid,
            field: path.to_string(),
            bad_value,
            detail: detail.into(),
        }
    }

    pub fn required(path: &FieldPath, detail: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::Required,
            field: path.to_string(),
            bad_value: Value::Null,
            detail: detail.into(),
        }
    }

    pub fn not_supported(path: &FieldPath, bad_value: Value, valid: &[String]) -> Self {
        Self {
            error_type: ErrorType::NotSupported,
            field: path.to_string(),
            bad_value,
            detail: format!("supported values: {}", valid.join(", ")),
        }
    }

    pub fn forbidden(path: &FieldPath, detail: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::Forbidden,
            field: path.to_string(),
            bad_value: Value::Null,
            detail: detail.into(),
        }
    }

    pub fn too_long(path: &FieldPath, bad_value: Value, max_length: usize) -> Self {
        Self {
            error_type: ErrorType::TooLong,
            field: path.to_string(),
            bad_value,
            detail: format!("may not be more than {max_length} bytes"),
        }
    }

    pub fn type_invalid(path: &FieldPath, bad_value: Value, detail: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::TypeInvalid,
            field: path.to_string(),
            bad_value,
            detail: detail.into(),
        }
    }

    /// The message body without the field prefix, matching the upstream
    /// rendering used inside Status causes
    pub fn body(&self) -> String {
        match self.error_type {
            ErrorType::Required | ErrorType::Forbidden | ErrorType::TooLong | ErrorType::TooMany => {
                if self.detail.is_empty() {
                    self.error_type.to_string()
                } else {
                    format!("{}: {}", self.error_type, self.detail)
                }
            }
            _ => {
                let value = render_value(&self.bad_value);
                if self.detail.is_empty() {
                    format!("{}: {}", self.error_type, value)
                } else {
                    format!("{}: {}: {}", self.error_type, value, self.detail)
                }
            }
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.body())
        } else {
            write!(f, "{}: {}", self.field, self.body())
        }
    }
}

impl std::error::Error for FieldError {}
