//! Custom per-GVK validators
//!
//! An extensible registry of validators that override the default
//! DNS-subdomain name rule and can append resource-specific field checks.
//! The one registered rule ships for RBAC kinds, whose names legally
//! contain colons (`system:admin`) and therefore use path-segment
//! validation.

use serde_json::Value;

use crate::field::FieldError;
use crate::names;
use kubevet_schema::GroupVersionKind;

pub trait CustomValidator: Send + Sync {
    /// Whether this validator applies to the given GVK
    fn matches(&self, gvk: &GroupVersionKind) -> bool;

    /// Resource-specific name validation replacing the DNS-subdomain rule
    fn validate_name(&self, name: &str, prefix: bool) -> Vec<String>;

    /// Additional resource-specific validation, appended after name checks
    fn validate_resource(&self, _obj: &Value, _namespace_scoped: bool) -> Vec<FieldError> {
        Vec::new()
    }
}

pub struct RbacValidator;

impl CustomValidator for RbacValidator {
    fn matches(&self, gvk: &GroupVersionKind) -> bool {
        gvk.group == "rbac.authorization.k8s.io"
            && matches!(
                gvk.kind.as_str(),
                "Role" | "ClusterRole" | "RoleBinding" | "ClusterRoleBinding"
            )
    }

    fn validate_name(&self, name: &str, prefix: bool) -> Vec<String> {
        names::validate_path_segment_name(name, prefix)
    }
}

static REGISTRY: &[&dyn CustomValidator] = &[&RbacValidator];

pub fn find_custom_validator(gvk: &GroupVersionKind) -> Option<&'static dyn CustomValidator> {
    REGISTRY.iter().copied().find(|v| v.matches(gvk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rbac_kinds_match() {
        for kind in ["Role", "ClusterRole", "RoleBinding", "ClusterRoleBinding"] {
            let gvk = GroupVersionKind::new("rbac.authorization.k8s.io", "v1", kind);
            assert!(find_custom_validator(&gvk).is_some(), "{kind} should match");
        }
    }

    #[test]
    fn test_other_kinds_do_not_match() {
        assert!(find_custom_validator(&GroupVersionKind::new("", "v1", "ConfigMap")).is_none());
        assert!(
            find_custom_validator(&GroupVersionKind::new("apps", "v1", "Deployment")).is_none()
        );
        // same kind name outside the rbac group
        assert!(find_custom_validator(&GroupVersionKind::new("other.io", "v1", "Role")).is_none());
    }

    #[test]
    fn test_rbac_name_rule() {
        let validator = RbacValidator;
        assert!(validator.validate_name("system:admin", false).is_empty());
        assert!(!validator.validate_name("system/admin", false).is_empty());
    }
}
