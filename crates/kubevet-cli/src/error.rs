//! CLI error types with exit code handling

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that maps onto process exit codes
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// At least one document failed validation
    #[error("validation failed")]
    #[diagnostic(code(kubevet::cli::validation))]
    Validation,

    /// Invalid arguments or unreadable inputs
    #[error("{message}")]
    #[diagnostic(code(kubevet::cli::usage))]
    Argument {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Unexpected failure unrelated to the documents being validated
    #[error("internal error: {message}")]
    #[diagnostic(code(kubevet::cli::internal))]
    Internal { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation => exit_codes::VALIDATION_ERROR,
            CliError::Argument { .. } => exit_codes::USAGE_ERROR,
            CliError::Internal { .. } => exit_codes::INTERNAL_ERROR,
        }
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
            help: None,
        }
    }

    pub fn argument_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
