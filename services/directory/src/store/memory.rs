//! In-memory implementation of the directory store.
//!
//! # Purpose
//! Implements [`AccessStore`] with maps guarded by `tokio::sync::RwLock`. It
//! backs local development, the CLI's default mode, and the integration
//! tests.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - Uniqueness rules are enforced by the kernel's own [`Catalog`] and
//!   [`MembershipLedger`], so this backend rejects exactly what the Postgres
//!   unique indexes reject.
//!
//! # Metrics
//! Updates `commons_memberships_total` and `commons_resources_total` gauges
//! to keep observability behavior consistent with the durable backend.
use super::{AccessStore, StoreError, StoreResult};
use async_trait::async_trait;
use commons_authz::{
    AgentId, Catalog, JoinableRef, Membership, MembershipLedger, PermissionId, Query, RecordId,
    Resource, ResourcePermission, ResourceType, Role, RoleId, RoleResourcePermission,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type ResourceKey = (ResourceType, RecordId);

#[derive(Clone, Default)]
pub struct InMemoryStore {
    catalog: Arc<RwLock<Catalog>>,
    memberships: Arc<RwLock<MembershipLedger>>,
    resources: Arc<RwLock<HashMap<ResourceKey, Resource>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessStore for InMemoryStore {
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.roles().into_iter().cloned().collect())
    }

    async fn create_role(&self, role: Role) -> StoreResult<Role> {
        let mut catalog = self.catalog.write().await;
        catalog.add_role(role.clone())?;
        Ok(role)
    }

    async fn list_permissions(&self) -> StoreResult<Vec<ResourcePermission>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.permissions().into_iter().cloned().collect())
    }

    async fn create_permission(
        &self,
        permission: ResourcePermission,
    ) -> StoreResult<ResourcePermission> {
        let mut catalog = self.catalog.write().await;
        catalog.add_permission(permission.clone())?;
        Ok(permission)
    }

    async fn list_assignments(&self) -> StoreResult<Vec<RoleResourcePermission>> {
        Ok(self.catalog.read().await.assignments())
    }

    async fn assign_permission(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> StoreResult<()> {
        let mut catalog = self.catalog.write().await;
        catalog.assign(role_id, permission_id)?;
        Ok(())
    }

    async fn unassign_permission(
        &self,
        role_id: &RoleId,
        permission_id: &PermissionId,
    ) -> StoreResult<()> {
        let mut catalog = self.catalog.write().await;
        if !catalog.unassign(role_id, permission_id) {
            return Err(StoreError::NotFound(format!(
                "role {role_id} does not grant {permission_id}"
            )));
        }
        Ok(())
    }

    async fn grant_membership(&self, membership: Membership) -> StoreResult<Membership> {
        let catalog = self.catalog.read().await;
        catalog.check_membership(&membership)?;
        let mut ledger = self.memberships.write().await;
        ledger.grant(membership.clone())?;
        metrics::gauge!("commons_memberships_total").set(ledger.len() as f64);
        Ok(membership)
    }

    async fn revoke_membership(
        &self,
        member: &AgentId,
        joinable: &JoinableRef,
    ) -> StoreResult<Membership> {
        let mut ledger = self.memberships.write().await;
        let removed = ledger
            .revoke(member, joinable)
            .ok_or_else(|| StoreError::NotFound(format!("membership {member} in {joinable}")))?;
        metrics::gauge!("commons_memberships_total").set(ledger.len() as f64);
        Ok(removed)
    }

    async fn memberships_of(&self, member: &AgentId) -> StoreResult<Vec<Membership>> {
        let ledger = self.memberships.read().await;
        Ok(ledger.memberships_of(member).into_iter().cloned().collect())
    }

    async fn members_of(&self, joinable: &JoinableRef) -> StoreResult<Vec<Membership>> {
        let ledger = self.memberships.read().await;
        Ok(ledger.members_of(joinable).into_iter().cloned().collect())
    }

    async fn put_resource(&self, resource: Resource) -> StoreResult<Resource> {
        let mut resources = self.resources.write().await;
        resources.insert((resource.kind, resource.id.clone()), resource.clone());
        metrics::gauge!("commons_resources_total").set(resources.len() as f64);
        Ok(resource)
    }

    async fn get_resource(&self, kind: ResourceType, id: &RecordId) -> StoreResult<Resource> {
        let resources = self.resources.read().await;
        resources
            .get(&(kind, id.clone()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{kind} {id}")))
    }

    async fn delete_resource(&self, kind: ResourceType, id: &RecordId) -> StoreResult<()> {
        let mut resources = self.resources.write().await;
        if resources.remove(&(kind, id.clone())).is_none() {
            return Err(StoreError::NotFound(format!("{kind} {id}")));
        }
        metrics::gauge!("commons_resources_total").set(resources.len() as f64);
        Ok(())
    }

    async fn fetch(&self, query: &Query) -> StoreResult<Vec<Resource>> {
        let resources = self.resources.read().await;
        Ok(query
            .apply(resources.values())
            .into_iter()
            .cloned()
            .collect())
    }

    /// Revoke and grant under one ledger lock, so a failed reassign leaves
    /// the previous row in place.
    async fn reassign_membership(&self, membership: Membership) -> StoreResult<Option<Membership>> {
        let catalog = self.catalog.read().await;
        catalog.check_membership(&membership)?;
        let mut ledger = self.memberships.write().await;
        let previous = ledger.reassign(&membership.member, &membership.joinable, membership.role_id)?;
        metrics::gauge!("commons_memberships_total").set(ledger.len() as f64);
        Ok(previous)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
