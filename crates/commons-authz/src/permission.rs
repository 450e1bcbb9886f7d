//! Permission identifiers checked by policy code.
//!
//! # Purpose
//! The identifier string is the contract between policies and the catalog:
//! policies never reference numeric or row ids, only these names.
//!
//! # Key invariants
//! - Identifiers are unique per resource type (enforced by the catalog).
//! - [`MANAGE_PLATFORM`] is the elevated manager grant. The resolver treats it
//!   like any other identifier; the override semantics live in
//!   [`is_platform_manager`](crate::is_platform_manager).
//!
//! # Examples
//! ```rust
//! use commons_authz::{canonical_permission, MANAGE_PLATFORM};
//!
//! assert_eq!(canonical_permission("manage_platform"), Some(MANAGE_PLATFORM));
//! assert_eq!(canonical_permission("manage_everything"), None);
//! ```
use crate::ResourceType;

pub const MANAGE_PLATFORM: &str = "manage_platform";
pub const READ_PLATFORM: &str = "read_platform";
pub const UPDATE_PLATFORM: &str = "update_platform";
pub const CREATE_COMMUNITY: &str = "create_community";
pub const CREATE_PAGE: &str = "create_page";
pub const UPDATE_PAGE: &str = "update_page";
pub const DESTROY_PAGE: &str = "destroy_page";
pub const READ_COMMUNITY: &str = "read_community";
pub const UPDATE_COMMUNITY: &str = "update_community";
pub const DESTROY_COMMUNITY: &str = "destroy_community";
pub const INVITE_COMMUNITY_MEMBER: &str = "invite_community_member";
pub const MANAGE_COMMUNITY_ROLES: &str = "manage_community_roles";

/// Built-in identifiers, grouped by the resource type whose roles grant them,
/// in display order.
pub const BUILTIN_PERMISSIONS: &[(&str, ResourceType)] = &[
    (MANAGE_PLATFORM, ResourceType::Platform),
    (READ_PLATFORM, ResourceType::Platform),
    (UPDATE_PLATFORM, ResourceType::Platform),
    (CREATE_COMMUNITY, ResourceType::Platform),
    (CREATE_PAGE, ResourceType::Platform),
    (UPDATE_PAGE, ResourceType::Platform),
    (DESTROY_PAGE, ResourceType::Platform),
    (READ_COMMUNITY, ResourceType::Community),
    (UPDATE_COMMUNITY, ResourceType::Community),
    (DESTROY_COMMUNITY, ResourceType::Community),
    (INVITE_COMMUNITY_MEMBER, ResourceType::Community),
    (MANAGE_COMMUNITY_ROLES, ResourceType::Community),
];

/// Validate and normalize a built-in permission identifier.
pub fn canonical_permission(identifier: &str) -> Option<&'static str> {
    BUILTIN_PERMISSIONS
        .iter()
        .map(|(name, _)| *name)
        .find(|name| *name == identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_identifiers_are_unique() {
        let names: HashSet<_> = BUILTIN_PERMISSIONS.iter().map(|(name, _)| name).collect();
        assert_eq!(names.len(), BUILTIN_PERMISSIONS.len());
    }

    #[test]
    fn builtin_permissions_target_joinable_types() {
        assert!(
            BUILTIN_PERMISSIONS
                .iter()
                .all(|(_, kind)| kind.is_joinable())
        );
    }

    #[test]
    fn canonical_permission_rejects_unknown() {
        assert_eq!(canonical_permission(UPDATE_COMMUNITY), Some(UPDATE_COMMUNITY));
        assert_eq!(canonical_permission("update community"), None);
    }
}
