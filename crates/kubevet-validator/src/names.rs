//! Kubernetes name validation regimes
//!
//! Two regimes exist: the default DNS-1123 subdomain rule, and path-segment
//! validation for resources whose names legally contain colons (RBAC). The
//! message text matches upstream so causes are recognizable.

use once_cell::sync::Lazy;
use regex::Regex;

const DNS1123_SUBDOMAIN_FMT: &str =
    "[a-z0-9]([-a-z0-9]*[a-z0-9])?(\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*";
const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const QUALIFIED_NAME_FMT: &str = "([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]";
const LABEL_VALUE_FMT: &str = "(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?";

pub const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;
pub const QUALIFIED_NAME_MAX_LENGTH: usize = 63;
pub const LABEL_VALUE_MAX_LENGTH: usize = 63;

static DNS1123_SUBDOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{DNS1123_SUBDOMAIN_FMT}$")).unwrap());
static DNS1123_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{DNS1123_LABEL_FMT}$")).unwrap());
static QUALIFIED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{QUALIFIED_NAME_FMT}$")).unwrap());
static LABEL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{LABEL_VALUE_FMT}$")).unwrap());

/// A name validation function: `(name, prefix)` where `prefix` means the
/// name is a generateName prefix that the server will complete
pub type NameValidator = fn(&str, bool) -> Vec<String>;

pub fn is_dns1123_subdomain(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        errors.push(format!(
            "must be no more than {DNS1123_SUBDOMAIN_MAX_LENGTH} characters"
        ));
    }
    if !DNS1123_SUBDOMAIN.is_match(value) {
        errors.push(format!(
            "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, \
             '-' or '.', and must start and end with an alphanumeric character (e.g. \
             'example.com', regex used for validation is '{DNS1123_SUBDOMAIN_FMT}')"
        ));
    }
    errors
}

pub fn is_dns1123_label(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        errors.push(format!(
            "must be no more than {DNS1123_LABEL_MAX_LENGTH} characters"
        ));
    }
    if !DNS1123_LABEL.is_match(value) {
        errors.push(format!(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or \
             '-', and must start and end with an alphanumeric character (e.g. 'my-name', regex \
             used for validation is '{DNS1123_LABEL_FMT}')"
        ));
    }
    errors
}

/// The default name rule: DNS-1123 subdomain
pub fn validate_dns_subdomain_name(name: &str, _prefix: bool) -> Vec<String> {
    is_dns1123_subdomain(name)
}

/// Path-segment names may contain anything legal in one URL path segment;
/// `.` and `..` are reserved and separators are forbidden
pub fn validate_path_segment_name(name: &str, prefix: bool) -> Vec<String> {
    let mut errors = Vec::new();
    if !prefix {
        if name == "." {
            errors.push("may not be '.'".to_string());
        } else if name == ".." {
            errors.push("may not be '..'".to_string());
        }
    }
    if name.contains('/') {
        errors.push("may not contain '/'".to_string());
    }
    if name.contains('%') {
        errors.push("may not contain '%'".to_string());
    }
    errors
}

/// Label/annotation/finalizer keys: an optional DNS-subdomain prefix
/// followed by a qualified name part
pub fn is_qualified_name(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let (prefix, name) = match value.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, value),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            errors.push("prefix part must be non-empty".to_string());
        } else {
            for message in is_dns1123_subdomain(prefix) {
                errors.push(format!("prefix part {message}"));
            }
        }
    }
    if value.matches('/').count() > 1 {
        errors.push(
            "a qualified name must consist of alphanumeric characters, '-', '_' or '.', with an \
             optional DNS subdomain prefix and '/' (e.g. 'example.com/MyName')"
                .to_string(),
        );
        return errors;
    }

    if name.is_empty() {
        errors.push("name part must be non-empty".to_string());
    } else {
        if name.len() > QUALIFIED_NAME_MAX_LENGTH {
            errors.push(format!(
                "name part must be no more than {QUALIFIED_NAME_MAX_LENGTH} characters"
            ));
        }
        if !QUALIFIED_NAME.is_match(name) {
            errors.push(
                "name part must consist of alphanumeric characters, '-', '_' or '.', and must \
                 start and end with an alphanumeric character"
                    .to_string(),
            );
        }
    }
    errors
}

pub fn is_valid_label_value(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        errors.push(format!(
            "must be no more than {LABEL_VALUE_MAX_LENGTH} characters"
        ));
    }
    if !LABEL_VALUE.is_match(value) {
        errors.push(
            "a valid label must be an empty string or consist of alphanumeric characters, '-', \
             '_' or '.', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errors
}
