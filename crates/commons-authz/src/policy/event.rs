use super::{Policy, PolicyContext};
use crate::permission::UPDATE_COMMUNITY;

/// Events are visible to the public when public, and otherwise to their
/// creator, invitees, and members of any declared host.
pub struct EventPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> EventPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }

    /// The agent may act for a host, not merely belong to it.
    fn manages_host(&self) -> bool {
        self.ctx
            .record
            .hosts
            .iter()
            .any(|host| self.ctx.permitted_within(UPDATE_COMMUNITY, Some(host)))
    }
}

impl Policy for EventPolicy<'_> {
    fn index(&self) -> bool {
        true
    }

    fn show(&self) -> bool {
        self.ctx.record.privacy_public()
            || self.ctx.is_creator()
            || self.ctx.represents_host()
            || self.ctx.is_invited()
            || self.ctx.is_manager()
    }

    fn create(&self) -> bool {
        self.ctx.agent_present()
    }

    fn update(&self) -> bool {
        self.ctx.is_creator() || self.manages_host() || self.ctx.is_manager()
    }

    fn destroy(&self) -> bool {
        self.ctx.destroyable() && self.update()
    }
}
