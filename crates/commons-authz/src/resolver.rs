//! Agent permission resolution.
//!
//! # Purpose and responsibility
//! Decides whether an agent holds a named permission by walking its
//! memberships and the roles those memberships reference.
//!
//! # Where it fits
//! Policies and scopes never read the catalog directly; they ask a
//! [`Principal`], the flattened grant table the [`Resolver`] builds once per
//! authorization pass.
//!
//! # Key invariants and assumptions
//! - An absent agent holds no permission.
//! - [`Resolver::permitted_to`] is a global check: a role held in any
//!   container grants the identifier.
//! - [`Resolver::permitted_within`] only counts memberships whose joinable is
//!   the given container.
//! - A membership only counts when its role exists and is scoped to the
//!   membership's container kind. A platform role held inside a community
//!   grants nothing.
//! - The manager identifier gets no special case here; the override lives in
//!   [`is_platform_manager`].
//!
//! # Security considerations
//! - A `Principal` must not outlive the request it was resolved for; grants
//!   revoked after resolution keep applying to that value.
use crate::permission::MANAGE_PLATFORM;
use crate::{Agent, AgentId, Catalog, JoinableRef, Membership, ResourceType};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'c> {
    catalog: &'c Catalog,
}

impl<'c> Resolver<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Whether any of the agent's roles, in any container, grants `permission`.
    ///
    /// # Example
    /// ```rust
    /// use commons_authz::{Agent, Catalog, Resolver};
    ///
    /// let catalog = Catalog::new();
    /// let resolver = Resolver::new(&catalog);
    /// assert!(!resolver.permitted_to(None, "manage_platform"));
    /// assert!(!resolver.permitted_to(Some(&Agent::new("p1")), "manage_platform"));
    /// ```
    pub fn permitted_to(&self, agent: Option<&Agent>, permission: &str) -> bool {
        let Some(agent) = agent else {
            return false;
        };
        agent
            .memberships
            .iter()
            .filter(|membership| self.role_applies(&agent.id, membership))
            .any(|membership| self.catalog.role_grants(&membership.role_id, permission))
    }

    /// Whether the agent's role in `container` grants `permission`.
    pub fn permitted_within(
        &self,
        agent: Option<&Agent>,
        permission: &str,
        container: &JoinableRef,
    ) -> bool {
        let Some(agent) = agent else {
            return false;
        };
        agent
            .memberships
            .iter()
            .filter(|membership| &membership.joinable == container)
            .filter(|membership| self.role_applies(&agent.id, membership))
            .any(|membership| self.catalog.role_grants(&membership.role_id, permission))
    }

    /// Flatten the agent's grants into a [`Principal`] for one authorization
    /// pass.
    pub fn principal(&self, agent: &Agent) -> Principal {
        // Step 1: remember every container the agent belongs to.
        let joined: BTreeSet<JoinableRef> = agent
            .memberships
            .iter()
            .map(|membership| membership.joinable.clone())
            .collect();

        // Step 2: map each granted identifier to the containers granting it.
        let mut grants: HashMap<String, BTreeSet<JoinableRef>> = HashMap::new();
        for membership in &agent.memberships {
            if !self.role_applies(&agent.id, membership) {
                continue;
            }
            for permission in self.catalog.permissions_for_role(&membership.role_id) {
                grants
                    .entry(permission.identifier.clone())
                    .or_default()
                    .insert(membership.joinable.clone());
            }
        }

        Principal {
            id: agent.id.clone(),
            joined,
            grants,
        }
    }

    /// Whether the membership's role exists and is scoped to its container kind.
    fn role_applies(&self, agent: &AgentId, membership: &Membership) -> bool {
        match self.catalog.role(&membership.role_id) {
            None => {
                tracing::warn!(
                    agent = %agent,
                    role = %membership.role_id,
                    joinable = %membership.joinable,
                    "membership references a role missing from the catalog"
                );
                false
            }
            Some(role) if role.resource_type != membership.joinable.kind => {
                tracing::warn!(
                    agent = %agent,
                    role = %membership.role_id,
                    role_type = %role.resource_type,
                    joinable = %membership.joinable,
                    "membership role is scoped to another container kind"
                );
                false
            }
            Some(_) => true,
        }
    }
}

/// An agent resolved against the catalog for a single authorization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: AgentId,
    joined: BTreeSet<JoinableRef>,
    grants: HashMap<String, BTreeSet<JoinableRef>>,
}

impl Principal {
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn permitted_to(&self, permission: &str) -> bool {
        self.grants
            .get(permission)
            .is_some_and(|containers| !containers.is_empty())
    }

    pub fn permitted_within(&self, permission: &str, container: &JoinableRef) -> bool {
        self.grants
            .get(permission)
            .is_some_and(|containers| containers.contains(container))
    }

    /// Containers in which the agent's role grants `permission`.
    pub fn containers_granting<'a>(
        &'a self,
        permission: &str,
    ) -> impl Iterator<Item = &'a JoinableRef> + 'a {
        self.grants.get(permission).into_iter().flatten()
    }

    pub fn is_member_of(&self, container: &JoinableRef) -> bool {
        self.joined.contains(container)
    }

    /// Containers of `kind` the agent holds any membership in.
    pub fn joined(&self, kind: ResourceType) -> impl Iterator<Item = &JoinableRef> + '_ {
        self.joined.iter().filter(move |joinable| joinable.kind == kind)
    }

    pub fn all_joined(&self) -> impl Iterator<Item = &JoinableRef> + '_ {
        self.joined.iter()
    }

    /// Granted identifiers, sorted for stable output.
    pub fn permissions(&self) -> Vec<&str> {
        let mut names: Vec<_> = self
            .grants
            .iter()
            .filter(|(_, containers)| !containers.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

/// The single manager-override predicate shared by every policy and scope.
pub fn is_platform_manager(principal: Option<&Principal>) -> bool {
    principal.is_some_and(|principal| principal.permitted_to(MANAGE_PLATFORM))
}
