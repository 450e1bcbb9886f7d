use super::{Policy, PolicyContext};
use crate::Action;
use crate::permission::INVITE_COMMUNITY_MEMBER;

/// Invitations carry no privacy. The invitee is the record's subject and the
/// container is the community being joined.
pub struct InvitationPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> InvitationPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }

    fn may_invite(&self) -> bool {
        self.ctx
            .permitted_within(INVITE_COMMUNITY_MEMBER, self.ctx.record.container.as_ref())
    }
}

impl Policy for InvitationPolicy<'_> {
    fn index(&self) -> bool {
        self.ctx.agent_present()
    }

    fn show(&self) -> bool {
        self.ctx.is_subject() || self.ctx.is_creator() || self.may_invite() || self.ctx.is_manager()
    }

    fn create(&self) -> bool {
        self.may_invite() || self.ctx.is_manager()
    }

    fn update(&self) -> bool {
        self.ctx.is_creator() || self.ctx.is_manager()
    }

    fn destroy(&self) -> bool {
        self.ctx.destroyable() && (self.update() || self.may_invite())
    }

    fn perform(&self, action: Action) -> bool {
        match action {
            Action::Resend => self.update(),
            Action::Accept | Action::Decline => self.ctx.is_subject(),
            _ => false,
        }
    }
}
