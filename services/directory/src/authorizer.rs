//! Store-backed authorization facade.
//!
//! Each call is one authorization pass: the catalog and the agent's
//! memberships are read fresh, resolved into a [`Principal`], and dropped
//! when the call returns. Revoked grants therefore stop applying on the next
//! call.
use crate::store::{AccessStore, StoreResult};
use commons_authz::{
    Action, Agent, AgentId, Principal, Query, RecordId, Resolver, Resource, ResourceType, Scope,
    authorize,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct Authorizer {
    store: Arc<dyn AccessStore>,
}

impl Authorizer {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn AccessStore> {
        &self.store
    }

    /// Resolve `agent` against the current catalog. `None` stays anonymous.
    pub async fn principal(&self, agent: Option<&AgentId>) -> StoreResult<Option<Principal>> {
        let Some(agent_id) = agent else {
            return Ok(None);
        };
        let catalog = self.store.load_catalog().await?;
        let agent = Agent {
            id: agent_id.clone(),
            memberships: self.store.memberships_of(agent_id).await?,
        };
        Ok(Some(Resolver::new(&catalog).principal(&agent)))
    }

    /// Decide `action` on a stored record. A missing record is
    /// `StoreError::NotFound`, not a denial.
    pub async fn authorize(
        &self,
        agent: Option<&AgentId>,
        kind: ResourceType,
        id: &RecordId,
        action: Action,
    ) -> StoreResult<bool> {
        let record = self.store.get_resource(kind, id).await?;
        self.authorize_record(agent, &record, action).await
    }

    /// Decide `action` on a record the caller already holds, e.g. one about
    /// to be created.
    pub async fn authorize_record(
        &self,
        agent: Option<&AgentId>,
        record: &Resource,
        action: Action,
    ) -> StoreResult<bool> {
        let principal = self.principal(agent).await?;
        let allowed = authorize(principal.as_ref(), record, action);
        let outcome = if allowed { "allow" } else { "deny" };
        metrics::counter!("commons_authz_decisions_total", "outcome" => outcome).increment(1);
        Ok(allowed)
    }

    /// Records of `base` the agent may list, in scope order.
    pub async fn visible(&self, agent: Option<&AgentId>, base: &Query) -> StoreResult<Vec<Resource>> {
        let principal = self.principal(agent).await?;
        let query = Scope::new(principal.as_ref(), base.clone()).resolve();
        let rows = self.store.fetch(&query).await?;
        tracing::debug!(
            agent = agent.map(AgentId::as_str).unwrap_or("anonymous"),
            kind = %base.kind(),
            count = rows.len(),
            "scope fetched"
        );
        Ok(rows)
    }
}
