use super::{Policy, PolicyContext};
use crate::permission::{MANAGE_COMMUNITY_ROLES, UPDATE_COMMUNITY, UPDATE_PLATFORM};

/// Membership rows. The member is the record's subject and the joinable is
/// its container.
pub struct MembershipPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> MembershipPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }

    fn manages_container(&self) -> bool {
        let container = self.ctx.record.container.as_ref();
        [UPDATE_COMMUNITY, MANAGE_COMMUNITY_ROLES, UPDATE_PLATFORM]
            .into_iter()
            .any(|permission| self.ctx.permitted_within(permission, container))
    }
}

impl Policy for MembershipPolicy<'_> {
    fn index(&self) -> bool {
        self.ctx.agent_present()
    }

    fn show(&self) -> bool {
        self.ctx.is_subject() || self.manages_container() || self.ctx.is_manager()
    }

    fn create(&self) -> bool {
        self.manages_container() || self.ctx.is_manager()
    }

    fn update(&self) -> bool {
        self.manages_container() || self.ctx.is_manager()
    }

    fn destroy(&self) -> bool {
        self.ctx.destroyable()
            && (self.ctx.is_subject() || self.manages_container() || self.ctx.is_manager())
    }
}

#[cfg(test)]
mod tests {
    use crate::policy::test_support::principal;
    use crate::{Action, JoinableRef, Resource, ResourceType, authorize};

    #[test]
    fn facilitators_manage_memberships_in_their_community() {
        let row = Resource::new(ResourceType::Membership, "m1")
            .in_container(JoinableRef::community("c1"))
            .about("p9");
        let facilitator = principal(
            "p1",
            &[(JoinableRef::community("c1"), "community_facilitator")],
        );
        let member = principal("p2", &[(JoinableRef::community("c1"), "community_member")]);
        let subject = principal("p9", &[]);
        assert!(authorize(Some(&facilitator), &row, Action::Update));
        assert!(!authorize(Some(&member), &row, Action::Update));
        assert!(!authorize(Some(&member), &row, Action::Show));
        assert!(authorize(Some(&subject), &row, Action::Show));
        assert!(authorize(Some(&subject), &row, Action::Destroy));
        assert!(!authorize(Some(&subject), &row, Action::Update));
    }
}
