//! Built-in roles and permissions.
//!
//! Seeds the platform and community roles the rest of the system expects.
//! Every seeded row is `protected`, so policies never let it be edited or
//! destroyed. Seeding is idempotent: rows that already exist are kept.
use crate::store::{AccessStore, StoreError, StoreResult};
use commons_authz::permission::{
    BUILTIN_PERMISSIONS, CREATE_COMMUNITY, CREATE_PAGE, DESTROY_COMMUNITY, DESTROY_PAGE,
    INVITE_COMMUNITY_MEMBER, MANAGE_COMMUNITY_ROLES, MANAGE_PLATFORM, READ_COMMUNITY,
    READ_PLATFORM, UPDATE_COMMUNITY, UPDATE_PAGE, UPDATE_PLATFORM,
};
use commons_authz::{
    AuthzResult, Catalog, PermissionId, ResourcePermission, ResourceType, Role, RoleId,
};

struct RoleSeed {
    identifier: &'static str,
    name: &'static str,
    resource_type: ResourceType,
    grants: &'static [&'static str],
}

const ROLE_SEEDS: &[RoleSeed] = &[
    RoleSeed {
        identifier: "platform_manager",
        name: "Platform Manager",
        resource_type: ResourceType::Platform,
        grants: &[
            MANAGE_PLATFORM,
            READ_PLATFORM,
            UPDATE_PLATFORM,
            CREATE_COMMUNITY,
            CREATE_PAGE,
            UPDATE_PAGE,
            DESTROY_PAGE,
        ],
    },
    RoleSeed {
        identifier: "platform_editor",
        name: "Platform Editor",
        resource_type: ResourceType::Platform,
        grants: &[READ_PLATFORM, CREATE_PAGE, UPDATE_PAGE, DESTROY_PAGE],
    },
    RoleSeed {
        identifier: "platform_member",
        name: "Platform Member",
        resource_type: ResourceType::Platform,
        grants: &[READ_PLATFORM, CREATE_COMMUNITY],
    },
    RoleSeed {
        identifier: "community_governance_council",
        name: "Governance Council",
        resource_type: ResourceType::Community,
        grants: &[
            READ_COMMUNITY,
            UPDATE_COMMUNITY,
            DESTROY_COMMUNITY,
            INVITE_COMMUNITY_MEMBER,
            MANAGE_COMMUNITY_ROLES,
        ],
    },
    RoleSeed {
        identifier: "community_facilitator",
        name: "Facilitator",
        resource_type: ResourceType::Community,
        grants: &[READ_COMMUNITY, UPDATE_COMMUNITY, INVITE_COMMUNITY_MEMBER],
    },
    RoleSeed {
        identifier: "community_member",
        name: "Member",
        resource_type: ResourceType::Community,
        grants: &[READ_COMMUNITY],
    },
];

/// Seeded role and permission ids equal their identifiers.
pub fn default_roles() -> Vec<Role> {
    ROLE_SEEDS
        .iter()
        .enumerate()
        .map(|(position, seed)| Role {
            id: RoleId::new(seed.identifier),
            identifier: seed.identifier.to_string(),
            name: seed.name.to_string(),
            resource_type: seed.resource_type,
            protected: true,
            position: position as i32,
        })
        .collect()
}

pub fn default_permissions() -> Vec<ResourcePermission> {
    BUILTIN_PERMISSIONS
        .iter()
        .enumerate()
        .map(|(position, (identifier, resource_type))| ResourcePermission {
            id: PermissionId::new(*identifier),
            identifier: identifier.to_string(),
            resource_type: *resource_type,
            protected: true,
            position: position as i32,
        })
        .collect()
}

fn default_assignments() -> impl Iterator<Item = (RoleId, PermissionId)> {
    ROLE_SEEDS.iter().flat_map(|seed| {
        seed.grants
            .iter()
            .map(|grant| (RoleId::new(seed.identifier), PermissionId::new(*grant)))
    })
}

/// The seeded catalog, without touching a store.
pub fn default_catalog() -> AuthzResult<Catalog> {
    let mut catalog = Catalog::new();
    for role in default_roles() {
        catalog.add_role(role)?;
    }
    for permission in default_permissions() {
        catalog.add_permission(permission)?;
    }
    for (role_id, permission_id) in default_assignments() {
        catalog.assign(&role_id, &permission_id)?;
    }
    Ok(catalog)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: usize,
    pub permissions: usize,
    pub assignments: usize,
}

/// Insert the default catalog, skipping rows that already exist.
pub async fn seed_catalog(store: &dyn AccessStore) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();
    for role in default_roles() {
        report.roles += inserted(store.create_role(role).await)?;
    }
    for permission in default_permissions() {
        report.permissions += inserted(store.create_permission(permission).await)?;
    }
    for (role_id, permission_id) in default_assignments() {
        report.assignments += inserted(store.assign_permission(&role_id, &permission_id).await)?;
    }
    tracing::info!(
        roles = report.roles,
        permissions = report.permissions,
        assignments = report.assignments,
        backend = store.backend_name(),
        "catalog seeded"
    );
    Ok(report)
}

fn inserted<T>(result: StoreResult<T>) -> StoreResult<usize> {
    match result {
        Ok(_) => Ok(1),
        Err(StoreError::Conflict(_)) => Ok(0),
        Err(err) => Err(err),
    }
}
