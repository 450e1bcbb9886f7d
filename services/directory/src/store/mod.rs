use async_trait::async_trait;
use commons_authz::{
    AgentId, AuthzError, Catalog, JoinableRef, Membership, PermissionId, Query, RecordId,
    Resource, ResourcePermission, ResourceType, Role, RoleId, RoleResourcePermission,
};
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<AuthzError> for StoreError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Conflict(message) => StoreError::Conflict(message),
            err @ AuthzError::RoleOutOfScope { .. } => StoreError::Conflict(err.to_string()),
            AuthzError::UnknownRole(id) => StoreError::NotFound(format!("role {id}")),
            AuthzError::UnknownPermission(id) => StoreError::NotFound(format!("permission {id}")),
            other => StoreError::Unexpected(other.into()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

/// Persistence for catalog rows, memberships, and protected records.
///
/// Every read returns a fresh snapshot; callers build one
/// [`Principal`](commons_authz::Principal) per authorization pass from them.
#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;
    async fn create_role(&self, role: Role) -> StoreResult<Role>;
    async fn list_permissions(&self) -> StoreResult<Vec<ResourcePermission>>;
    async fn create_permission(
        &self,
        permission: ResourcePermission,
    ) -> StoreResult<ResourcePermission>;
    async fn list_assignments(&self) -> StoreResult<Vec<RoleResourcePermission>>;
    async fn assign_permission(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> StoreResult<()>;
    async fn unassign_permission(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> StoreResult<()>;

    async fn grant_membership(&self, membership: Membership) -> StoreResult<Membership>;
    async fn revoke_membership(
        &self,
        member: &AgentId,
        joinable: &JoinableRef,
    ) -> StoreResult<Membership>;
    async fn memberships_of(&self, member: &AgentId) -> StoreResult<Vec<Membership>>;
    async fn members_of(&self, joinable: &JoinableRef) -> StoreResult<Vec<Membership>>;

    /// Insert or replace a record.
    async fn put_resource(&self, resource: Resource) -> StoreResult<Resource>;
    async fn get_resource(&self, kind: ResourceType, id: &RecordId) -> StoreResult<Resource>;
    async fn delete_resource(&self, kind: ResourceType, id: &RecordId) -> StoreResult<()>;
    /// Evaluate a (usually scope-resolved) query.
    async fn fetch(&self, query: &Query) -> StoreResult<Vec<Resource>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;

    /// Current catalog, validated.
    async fn load_catalog(&self) -> StoreResult<Catalog> {
        let roles = self.list_roles().await?;
        let permissions = self.list_permissions().await?;
        let assignments = self.list_assignments().await?;
        Ok(Catalog::from_parts(roles, permissions, assignments)?)
    }

    /// Role change: the existing row is destroyed and a new one created.
    async fn reassign_membership(&self, membership: Membership) -> StoreResult<Option<Membership>> {
        let previous = match self
            .revoke_membership(&membership.member, &membership.joinable)
            .await
        {
            Ok(previous) => Some(previous),
            Err(StoreError::NotFound(_)) => None,
            Err(err) => return Err(err),
        };
        self.grant_membership(membership).await?;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_errors_map_to_store_errors() {
        assert!(matches!(
            StoreError::from(AuthzError::Conflict("dup".into())),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            StoreError::from(AuthzError::UnknownRole("r".into())),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from(AuthzError::RoleOutOfScope {
                role: "platform_manager".into(),
                role_type: ResourceType::Platform,
                joinable: "community:c1".into(),
            }),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            StoreError::from(AuthzError::InvalidAction("x".into())),
            StoreError::Unexpected(_)
        ));
    }
}
