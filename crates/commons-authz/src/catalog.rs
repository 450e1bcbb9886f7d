//! Role and permission catalog.
//!
//! # Purpose
//! Holds the long-lived catalog rows (roles, resource permissions, and their
//! many-to-many assignment) that the resolver reads on every check.
//!
//! # How it fits
//! The `directory` service loads a [`Catalog`] from its store at the start of
//! an authorization pass; the kernel treats it as read-only input.
//!
//! # Key invariants
//! - Role identifiers are unique per `resource_type`; so are permission
//!   identifiers.
//! - A `(role, permission)` pair is assigned at most once.
//! - Permission sets are resolved live: changing an assignment never touches
//!   membership rows.
use crate::{AuthzError, AuthzResult, Membership, PermissionId, ResourceType, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Named, resource-type-scoped role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub identifier: String,
    pub name: String,
    pub resource_type: ResourceType,
    /// Seeded roles cannot be edited or destroyed.
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub position: i32,
}

/// Named permission identifier scoped to a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermission {
    pub id: PermissionId,
    pub identifier: String,
    pub resource_type: ResourceType,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub position: i32,
}

/// Join row granting a permission to a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleResourcePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    roles: HashMap<RoleId, Role>,
    permissions: HashMap<PermissionId, ResourcePermission>,
    assignments: HashMap<RoleId, BTreeSet<PermissionId>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from stored rows, validating every uniqueness rule.
    pub fn from_parts(
        roles: Vec<Role>,
        permissions: Vec<ResourcePermission>,
        assignments: Vec<RoleResourcePermission>,
    ) -> AuthzResult<Self> {
        let mut catalog = Self::new();
        for role in roles {
            catalog.add_role(role)?;
        }
        for permission in permissions {
            catalog.add_permission(permission)?;
        }
        for assignment in assignments {
            catalog.assign(&assignment.role_id, &assignment.permission_id)?;
        }
        Ok(catalog)
    }

    pub fn add_role(&mut self, role: Role) -> AuthzResult<()> {
        if self.roles.contains_key(&role.id) {
            return Err(AuthzError::Conflict(format!("role {} exists", role.id)));
        }
        if self
            .role_by_identifier(role.resource_type, &role.identifier)
            .is_some()
        {
            return Err(AuthzError::Conflict(format!(
                "role identifier {} exists for {}",
                role.identifier, role.resource_type
            )));
        }
        self.roles.insert(role.id.clone(), role);
        Ok(())
    }

    pub fn add_permission(&mut self, permission: ResourcePermission) -> AuthzResult<()> {
        if self.permissions.contains_key(&permission.id) {
            return Err(AuthzError::Conflict(format!(
                "permission {} exists",
                permission.id
            )));
        }
        if self
            .permission_by_identifier(permission.resource_type, &permission.identifier)
            .is_some()
        {
            return Err(AuthzError::Conflict(format!(
                "permission identifier {} exists for {}",
                permission.identifier, permission.resource_type
            )));
        }
        self.permissions.insert(permission.id.clone(), permission);
        Ok(())
    }

    /// Grant `permission_id` to `role_id`.
    pub fn assign(&mut self, role_id: &RoleId, permission_id: &PermissionId) -> AuthzResult<()> {
        if !self.roles.contains_key(role_id) {
            return Err(AuthzError::UnknownRole(role_id.to_string()));
        }
        if !self.permissions.contains_key(permission_id) {
            return Err(AuthzError::UnknownPermission(permission_id.to_string()));
        }
        let granted = self.assignments.entry(role_id.clone()).or_default();
        if !granted.insert(permission_id.clone()) {
            return Err(AuthzError::Conflict(format!(
                "role {role_id} already grants {permission_id}"
            )));
        }
        Ok(())
    }

    /// Remove a grant; returns whether it existed.
    pub fn unassign(&mut self, role_id: &RoleId, permission_id: &PermissionId) -> bool {
        self.assignments
            .get_mut(role_id)
            .map(|granted| granted.remove(permission_id))
            .unwrap_or(false)
    }

    pub fn role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.get(id)
    }

    pub fn role_by_identifier(&self, resource_type: ResourceType, identifier: &str) -> Option<&Role> {
        self.roles
            .values()
            .find(|role| role.resource_type == resource_type && role.identifier == identifier)
    }

    pub fn permission_by_identifier(
        &self,
        resource_type: ResourceType,
        identifier: &str,
    ) -> Option<&ResourcePermission> {
        self.permissions.values().find(|permission| {
            permission.resource_type == resource_type && permission.identifier == identifier
        })
    }

    /// Every role, in display order.
    pub fn roles(&self) -> Vec<&Role> {
        let mut roles: Vec<_> = self.roles.values().collect();
        roles.sort_by(|a, b| {
            (a.resource_type, a.position, &a.identifier).cmp(&(
                b.resource_type,
                b.position,
                &b.identifier,
            ))
        });
        roles
    }

    /// Every permission row, in display order.
    pub fn permissions(&self) -> Vec<&ResourcePermission> {
        let mut permissions: Vec<_> = self.permissions.values().collect();
        permissions.sort_by(|a, b| {
            (a.resource_type, a.position, &a.identifier).cmp(&(
                b.resource_type,
                b.position,
                &b.identifier,
            ))
        });
        permissions
    }

    /// Roles governing `resource_type`, in display order.
    pub fn roles_for(&self, resource_type: ResourceType) -> Vec<&Role> {
        let mut roles: Vec<_> = self
            .roles
            .values()
            .filter(|role| role.resource_type == resource_type)
            .collect();
        roles.sort_by(|a, b| (a.position, &a.identifier).cmp(&(b.position, &b.identifier)));
        roles
    }

    /// Permissions granted to `role_id`, ordered by display position.
    pub fn permissions_for_role(&self, role_id: &RoleId) -> Vec<&ResourcePermission> {
        let mut granted: Vec<_> = self
            .assignments
            .get(role_id)
            .into_iter()
            .flatten()
            .filter_map(|permission_id| self.permissions.get(permission_id))
            .collect();
        granted.sort_by(|a, b| (a.position, &a.identifier).cmp(&(b.position, &b.identifier)));
        granted
    }

    /// Whether `role_id` currently grants the permission named `identifier`.
    pub fn role_grants(&self, role_id: &RoleId, identifier: &str) -> bool {
        self.permissions_for_role(role_id)
            .iter()
            .any(|permission| permission.identifier == identifier)
    }

    /// Reject a membership whose role is scoped to a different container kind
    /// than its joinable. Roles missing from the catalog pass; the resolver
    /// ignores them.
    pub fn check_membership(&self, membership: &Membership) -> AuthzResult<()> {
        match self.role(&membership.role_id) {
            Some(role) if role.resource_type != membership.joinable.kind => {
                Err(AuthzError::RoleOutOfScope {
                    role: role.id.to_string(),
                    role_type: role.resource_type,
                    joinable: membership.joinable.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn assignments(&self) -> Vec<RoleResourcePermission> {
        let mut rows: Vec<_> = self
            .assignments
            .iter()
            .flat_map(|(role_id, granted)| {
                granted.iter().map(move |permission_id| RoleResourcePermission {
                    role_id: role_id.clone(),
                    permission_id: permission_id.clone(),
                })
            })
            .collect();
        rows.sort();
        rows
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }
}
