use super::{Policy, PolicyContext};
use crate::Action;
use crate::permission::{CREATE_COMMUNITY, DESTROY_COMMUNITY, READ_COMMUNITY, UPDATE_COMMUNITY};

/// Community decisions, including the `join`/`leave` membership actions.
pub struct CommunityPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> CommunityPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }

    fn is_member(&self) -> bool {
        self.ctx.is_member_of(self.ctx.record.as_joinable().as_ref())
    }
}

impl Policy for CommunityPolicy<'_> {
    fn index(&self) -> bool {
        true
    }

    fn show(&self) -> bool {
        let own = self.ctx.record.as_joinable();
        self.ctx.record.privacy_public()
            || self.ctx.is_creator()
            || self.is_member()
            || self.ctx.permitted_within(READ_COMMUNITY, own.as_ref())
            || self.ctx.is_manager()
    }

    fn create(&self) -> bool {
        self.ctx.permitted_to(CREATE_COMMUNITY) || self.ctx.is_manager()
    }

    fn update(&self) -> bool {
        let own = self.ctx.record.as_joinable();
        self.ctx.permitted_within(UPDATE_COMMUNITY, own.as_ref()) || self.ctx.is_manager()
    }

    fn destroy(&self) -> bool {
        let own = self.ctx.record.as_joinable();
        self.ctx.destroyable()
            && !self.ctx.record.host
            && (self.ctx.permitted_within(DESTROY_COMMUNITY, own.as_ref()) || self.ctx.is_manager())
    }

    fn perform(&self, action: Action) -> bool {
        match action {
            Action::Join => {
                self.ctx.agent_present() && self.ctx.record.privacy_public() && !self.is_member()
            }
            Action::Leave => self.is_member() && !self.ctx.is_creator(),
            _ => false,
        }
    }
}
