use crate::{AgentId, Catalog, JoinableRef, Membership, MembershipLedger, Resolver};
use serde::{Deserialize, Serialize};

/// The acting identity together with the memberships it currently holds.
///
/// Memberships are a snapshot read for one authorization pass; hosts must
/// build a fresh `Agent` per request so revoked grants stop applying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub memberships: Vec<Membership>,
}

impl Agent {
    pub fn new(id: impl Into<AgentId>) -> Self {
        Self {
            id: id.into(),
            memberships: Vec::new(),
        }
    }

    /// Load the agent's memberships from a ledger.
    pub fn from_ledger(id: impl Into<AgentId>, ledger: &MembershipLedger) -> Self {
        let id = id.into();
        let memberships = ledger.memberships_of(&id).into_iter().cloned().collect();
        Self { id, memberships }
    }

    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.memberships.push(membership);
        self
    }

    pub fn memberships(&self) -> &[Membership] {
        &self.memberships
    }

    pub fn is_member_of(&self, joinable: &JoinableRef) -> bool {
        self.memberships.iter().any(|row| &row.joinable == joinable)
    }

    /// Convenience delegate to [`Resolver::permitted_to`].
    pub fn permitted_to(&self, catalog: &Catalog, permission: &str) -> bool {
        Resolver::new(catalog).permitted_to(Some(self), permission)
    }
}

impl From<&str> for Agent {
    fn from(value: &str) -> Self {
        Agent::new(value)
    }
}
