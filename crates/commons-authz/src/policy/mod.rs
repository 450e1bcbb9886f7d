//! Per-resource-type decision objects.
//!
//! # Purpose and responsibility
//! Answers "may this agent perform this action on this record" with a plain
//! boolean. A `false` is an expected outcome, never an error.
//!
//! # Key invariants and assumptions
//! - Every decision method of [`Policy`] defaults to `false`; `new_form`
//!   delegates to `create` and `edit` to `update`.
//! - Overrides compose, from least to most specific: privacy short-circuit,
//!   ownership, membership-derived role, manager override, and finally the
//!   protection guard which vetoes every `destroy` on a protected record.
//! - Policies are stateless beyond the `(principal, record)` pair.
//!
//! # Examples
//! ```rust
//! use commons_authz::{policy_for, Action, Privacy, Resource, ResourceType};
//!
//! let community = Resource::new(ResourceType::Community, "c1").with_privacy(Privacy::Public);
//! let policy = policy_for(None, &community);
//! assert!(policy.decide(Action::Show));
//! assert!(!policy.decide(Action::Update));
//! ```
mod catalog;
mod checklist;
mod community;
mod content;
mod event;
mod invitation;
mod membership;
mod person;
mod platform;
mod upload;

pub use catalog::{ResourcePermissionPolicy, RolePolicy};
pub use checklist::ChecklistPolicy;
pub use community::CommunityPolicy;
pub use content::{PagePolicy, PostPolicy};
pub use event::EventPolicy;
pub use invitation::InvitationPolicy;
pub use membership::MembershipPolicy;
pub use person::PersonPolicy;
pub use platform::PlatformPolicy;
pub use upload::UploadPolicy;

use crate::{Action, AgentId, JoinableRef, Principal, Resource, ResourceType, is_platform_manager};

/// Decision-method contract shared by every resource type.
pub trait Policy {
    fn index(&self) -> bool {
        false
    }

    fn show(&self) -> bool {
        false
    }

    fn create(&self) -> bool {
        false
    }

    /// Rendering the creation form follows `create`.
    fn new_form(&self) -> bool {
        self.create()
    }

    fn update(&self) -> bool {
        false
    }

    /// Rendering the edit form follows `update`.
    fn edit(&self) -> bool {
        self.update()
    }

    fn destroy(&self) -> bool {
        false
    }

    /// Resource-specific actions (`join`, `resend`, ...).
    fn perform(&self, _action: Action) -> bool {
        false
    }

    fn decide(&self, action: Action) -> bool {
        match action {
            Action::Index => self.index(),
            Action::Show => self.show(),
            Action::New => self.new_form(),
            Action::Create => self.create(),
            Action::Edit => self.edit(),
            Action::Update => self.update(),
            Action::Destroy => self.destroy(),
            custom => self.perform(custom),
        }
    }
}

/// The `(agent, record)` pair a policy is constructed with, plus the
/// predicates policies compose.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub principal: Option<&'a Principal>,
    pub record: &'a Resource,
}

impl<'a> PolicyContext<'a> {
    pub fn new(principal: Option<&'a Principal>, record: &'a Resource) -> Self {
        Self { principal, record }
    }

    pub fn agent(&self) -> Option<&'a AgentId> {
        self.principal.map(Principal::id)
    }

    pub fn agent_present(&self) -> bool {
        self.principal.is_some()
    }

    pub fn is_manager(&self) -> bool {
        is_platform_manager(self.principal)
    }

    pub fn permitted_to(&self, permission: &str) -> bool {
        self.principal
            .is_some_and(|principal| principal.permitted_to(permission))
    }

    /// Scoped check; a missing container never grants.
    pub fn permitted_within(&self, permission: &str, container: Option<&JoinableRef>) -> bool {
        match (self.principal, container) {
            (Some(principal), Some(container)) => principal.permitted_within(permission, container),
            _ => false,
        }
    }

    pub fn is_creator(&self) -> bool {
        self.agent()
            .is_some_and(|agent| self.record.is_created_by(agent))
    }

    pub fn is_subject(&self) -> bool {
        self.agent().is_some_and(|agent| self.record.is_about(agent))
    }

    pub fn is_invited(&self) -> bool {
        self.agent().is_some_and(|agent| self.record.is_invited(agent))
    }

    pub fn is_member_of(&self, container: Option<&JoinableRef>) -> bool {
        match (self.principal, container) {
            (Some(principal), Some(container)) => principal.is_member_of(container),
            _ => false,
        }
    }

    /// The agent belongs to one of the record's declared hosts.
    pub fn represents_host(&self) -> bool {
        self.record
            .hosts
            .iter()
            .any(|host| self.is_member_of(Some(host)))
    }

    /// Protection guard applied to every destroy decision.
    pub fn destroyable(&self) -> bool {
        !self.record.protected
    }
}

/// Static lookup from the record's type to its policy.
pub fn policy_for<'a>(
    principal: Option<&'a Principal>,
    record: &'a Resource,
) -> Box<dyn Policy + 'a> {
    let ctx = PolicyContext::new(principal, record);
    match record.kind {
        ResourceType::Platform => Box::new(PlatformPolicy::new(ctx)),
        ResourceType::Community => Box::new(CommunityPolicy::new(ctx)),
        ResourceType::Person => Box::new(PersonPolicy::new(ctx)),
        ResourceType::Event => Box::new(EventPolicy::new(ctx)),
        ResourceType::Page => Box::new(PagePolicy::new(ctx)),
        ResourceType::Post => Box::new(PostPolicy::new(ctx)),
        ResourceType::Checklist => Box::new(ChecklistPolicy::new(ctx)),
        ResourceType::Invitation => Box::new(InvitationPolicy::new(ctx)),
        ResourceType::Upload => Box::new(UploadPolicy::new(ctx)),
        ResourceType::Role => Box::new(RolePolicy::new(ctx)),
        ResourceType::ResourcePermission => Box::new(ResourcePermissionPolicy::new(ctx)),
        ResourceType::Membership => Box::new(MembershipPolicy::new(ctx)),
    }
}

/// One authorization decision, traced at debug level.
pub fn authorize(principal: Option<&Principal>, record: &Resource, action: Action) -> bool {
    let allowed = policy_for(principal, record).decide(action);
    tracing::debug!(
        agent = principal.map(|p| p.id().as_str()).unwrap_or("anonymous"),
        kind = %record.kind,
        record = %record.id,
        %action,
        allowed,
        "authorization decision"
    );
    allowed
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{
        Agent, Catalog, JoinableRef, Membership, PermissionId, Principal, ResourcePermission,
        ResourceType, Resolver, Role, RoleId, permission,
    };

    /// Catalog with one role per built-in grant bundle.
    pub fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        for (name, kind) in permission::BUILTIN_PERMISSIONS {
            catalog
                .add_permission(ResourcePermission {
                    id: PermissionId::new(*name),
                    identifier: name.to_string(),
                    resource_type: *kind,
                    protected: true,
                    position: 0,
                })
                .expect("permission");
        }
        let roles: [(&str, ResourceType, &[&str]); 4] = [
            (
                "platform_manager",
                ResourceType::Platform,
                &[permission::MANAGE_PLATFORM],
            ),
            (
                "community_facilitator",
                ResourceType::Community,
                &[
                    permission::READ_COMMUNITY,
                    permission::UPDATE_COMMUNITY,
                    permission::INVITE_COMMUNITY_MEMBER,
                ],
            ),
            (
                "community_governance_council",
                ResourceType::Community,
                &[
                    permission::READ_COMMUNITY,
                    permission::UPDATE_COMMUNITY,
                    permission::DESTROY_COMMUNITY,
                    permission::MANAGE_COMMUNITY_ROLES,
                ],
            ),
            (
                "community_member",
                ResourceType::Community,
                &[permission::READ_COMMUNITY],
            ),
        ];
        for (identifier, resource_type, granted) in roles {
            catalog
                .add_role(Role {
                    id: RoleId::new(identifier),
                    identifier: identifier.to_string(),
                    name: identifier.to_string(),
                    resource_type,
                    protected: true,
                    position: 0,
                })
                .expect("role");
            for permission in granted {
                catalog
                    .assign(&RoleId::new(identifier), &PermissionId::new(*permission))
                    .expect("assign");
            }
        }
        catalog
    }

    pub fn principal(id: &str, memberships: &[(JoinableRef, &str)]) -> Principal {
        let catalog = catalog();
        let mut agent = Agent::new(id);
        for (joinable, role) in memberships {
            agent = agent.with_membership(Membership::new(id, joinable.clone(), *role));
        }
        Resolver::new(&catalog).principal(&agent)
    }

    pub fn manager() -> Principal {
        principal("admin", &[(JoinableRef::platform("host"), "platform_manager")])
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{manager, principal};
    use super::*;
    use crate::Privacy;

    struct Bare;

    impl Policy for Bare {}

    #[test]
    fn bare_policy_denies_everything() {
        for action in Action::ALL {
            assert!(!Bare.decide(action), "{action} should be denied");
        }
    }

    #[test]
    fn form_actions_follow_their_write_actions() {
        struct WriteOnly;
        impl Policy for WriteOnly {
            fn create(&self) -> bool {
                true
            }
            fn update(&self) -> bool {
                true
            }
        }
        assert!(WriteOnly.decide(Action::New));
        assert!(WriteOnly.decide(Action::Edit));
        assert!(!WriteOnly.decide(Action::Destroy));
    }

    #[test]
    fn protected_records_are_never_destroyed() {
        let admin = manager();
        let creator = principal("p1", &[]);
        for kind in ResourceType::ALL {
            let record = Resource::new(kind, "r1")
                .with_privacy(Privacy::Public)
                .created_by("p1")
                .about("p1")
                .protected();
            assert!(!authorize(Some(&admin), &record, Action::Destroy), "{kind}");
            assert!(!authorize(Some(&creator), &record, Action::Destroy), "{kind}");
        }
    }

    #[test]
    fn context_helpers_require_an_agent() {
        let record = Resource::new(ResourceType::Event, "e1")
            .created_by("p1")
            .hosted_by(JoinableRef::community("c1"));
        let ctx = PolicyContext::new(None, &record);
        assert!(!ctx.agent_present());
        assert!(!ctx.is_creator());
        assert!(!ctx.represents_host());
        assert!(!ctx.permitted_within("update_community", record.hosts.first()));
    }
}
