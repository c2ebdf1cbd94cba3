//! Standard exit codes for CLI operations

/// Success - every document validated
pub const SUCCESS: i32 = 0;

/// Validation failure - at least one document failed validation
pub const VALIDATION_ERROR: i32 = 1;

/// Usage error - invalid arguments, unreadable inputs (clap uses the same
/// code for parse errors)
pub const USAGE_ERROR: i32 = 2;

/// Internal error - unexpected failure unrelated to the documents
pub const INTERNAL_ERROR: i32 = 3;
