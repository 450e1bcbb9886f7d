//! Membership ledger: (member, joinable, role) grants.
//!
//! # Purpose
//! Records which agents hold which role inside which joinable container
//! (a platform or a community). The resolver walks these rows on every check.
//!
//! # Key invariants
//! - At most one membership per `(member, joinable)` pair. A role change is a
//!   revoke followed by a grant, never an in-place edit.
//! - A [`JoinableRef`] always names a joinable resource type.
//!
//! # Examples
//! ```rust
//! use commons_authz::{JoinableRef, Membership, MembershipLedger};
//!
//! let mut ledger = MembershipLedger::new();
//! let community = JoinableRef::community("c1");
//! ledger
//!     .grant(Membership::new("person-1", community.clone(), "community_member"))
//!     .expect("first grant");
//! assert!(ledger
//!     .grant(Membership::new("person-1", community, "community_facilitator"))
//!     .is_err());
//! ```
use crate::{AgentId, AuthzError, AuthzResult, RecordId, ResourceType, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to a joinable container (platform or community).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JoinableRef {
    pub kind: ResourceType,
    pub id: RecordId,
}

impl JoinableRef {
    /// Construct a reference, rejecting non-joinable kinds.
    pub fn new(kind: ResourceType, id: impl Into<RecordId>) -> AuthzResult<Self> {
        if !kind.is_joinable() {
            return Err(AuthzError::NotJoinable(kind));
        }
        Ok(Self {
            kind,
            id: id.into(),
        })
    }

    pub fn platform(id: impl Into<RecordId>) -> Self {
        Self {
            kind: ResourceType::Platform,
            id: id.into(),
        }
    }

    pub fn community(id: impl Into<RecordId>) -> Self {
        Self {
            kind: ResourceType::Community,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for JoinableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Parses the `kind:id` form produced by `Display`.
impl std::str::FromStr for JoinableRef {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        let (kind, id) = value
            .split_once(':')
            .ok_or_else(|| AuthzError::UnknownResourceType(value.to_string()))?;
        JoinableRef::new(kind.parse()?, id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub member: AgentId,
    pub joinable: JoinableRef,
    pub role_id: RoleId,
}

impl Membership {
    pub fn new(
        member: impl Into<AgentId>,
        joinable: JoinableRef,
        role_id: impl Into<RoleId>,
    ) -> Self {
        Self {
            member: member.into(),
            joinable,
            role_id: role_id.into(),
        }
    }
}

type LedgerKey = (AgentId, JoinableRef);

/// In-process membership ledger enforcing the one-role-per-container rule.
#[derive(Debug, Clone, Default)]
pub struct MembershipLedger {
    rows: BTreeMap<LedgerKey, Membership>,
}

impl MembershipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = Membership>) -> AuthzResult<Self> {
        let mut ledger = Self::new();
        for row in rows {
            ledger.grant(row)?;
        }
        Ok(ledger)
    }

    /// Add a membership; a second row for the same `(member, joinable)` pair
    /// is rejected with [`AuthzError::Conflict`].
    pub fn grant(&mut self, membership: Membership) -> AuthzResult<()> {
        let key = (membership.member.clone(), membership.joinable.clone());
        if self.rows.contains_key(&key) {
            return Err(AuthzError::Conflict(format!(
                "{} already holds a role in {}",
                membership.member, membership.joinable
            )));
        }
        self.rows.insert(key, membership);
        Ok(())
    }

    pub fn revoke(&mut self, member: &AgentId, joinable: &JoinableRef) -> Option<Membership> {
        self.rows.remove(&(member.clone(), joinable.clone()))
    }

    /// Replace the member's role in `joinable` by destroying and recreating
    /// the row. Returns the previous membership, if any.
    pub fn reassign(
        &mut self,
        member: &AgentId,
        joinable: &JoinableRef,
        role_id: RoleId,
    ) -> AuthzResult<Option<Membership>> {
        let previous = self.revoke(member, joinable);
        self.grant(Membership {
            member: member.clone(),
            joinable: joinable.clone(),
            role_id,
        })?;
        Ok(previous)
    }

    pub fn get(&self, member: &AgentId, joinable: &JoinableRef) -> Option<&Membership> {
        self.rows.get(&(member.clone(), joinable.clone()))
    }

    pub fn memberships_of(&self, member: &AgentId) -> Vec<&Membership> {
        self.rows
            .values()
            .filter(|row| &row.member == member)
            .collect()
    }

    pub fn members_of(&self, joinable: &JoinableRef) -> Vec<&Membership> {
        self.rows
            .values()
            .filter(|row| &row.joinable == joinable)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Membership> {
        self.rows.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joinable_ref_rejects_leaf_types() {
        assert!(JoinableRef::new(ResourceType::Community, "c1").is_ok());
        let err = JoinableRef::new(ResourceType::Event, "e1").expect_err("leaf type");
        assert_eq!(err, AuthzError::NotJoinable(ResourceType::Event));
    }

    #[test]
    fn second_membership_for_pair_is_rejected() {
        let mut ledger = MembershipLedger::new();
        let community = JoinableRef::community("c1");
        ledger
            .grant(Membership::new("p1", community.clone(), "member"))
            .expect("grant");
        let err = ledger
            .grant(Membership::new("p1", community.clone(), "facilitator"))
            .expect_err("duplicate pair");
        assert!(matches!(err, AuthzError::Conflict(_)));
        assert_eq!(ledger.len(), 1);

        ledger
            .grant(Membership::new("p1", JoinableRef::community("c2"), "member"))
            .expect("other container");
        ledger
            .grant(Membership::new("p2", community, "member"))
            .expect("other member");
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn reassign_replaces_the_row() {
        let mut ledger = MembershipLedger::new();
        let community = JoinableRef::community("c1");
        let member = AgentId::new("p1");
        ledger
            .grant(Membership::new("p1", community.clone(), "member"))
            .expect("grant");

        let previous = ledger
            .reassign(&member, &community, RoleId::new("facilitator"))
            .expect("reassign")
            .expect("previous row");
        assert_eq!(previous.role_id, RoleId::new("member"));
        assert_eq!(
            ledger.get(&member, &community).map(|row| &row.role_id),
            Some(&RoleId::new("facilitator"))
        );
        assert_eq!(ledger.members_of(&community).len(), 1);
    }

    #[test]
    fn joinable_ref_parses_its_display_form() {
        let parsed: JoinableRef = "community:c1".parse().expect("parse");
        assert_eq!(parsed, JoinableRef::community("c1"));
        assert_eq!(parsed.to_string(), "community:c1");
        assert!("event:e1".parse::<JoinableRef>().is_err());
        assert!("community".parse::<JoinableRef>().is_err());
    }

    #[test]
    fn revoke_unknown_pair_is_none() {
        let mut ledger = MembershipLedger::new();
        assert!(
            ledger
                .revoke(&AgentId::new("p1"), &JoinableRef::platform("host"))
                .is_none()
        );
        assert!(ledger.is_empty());
    }
}
