use super::{Policy, PolicyContext};
use crate::permission::{READ_PLATFORM, UPDATE_PLATFORM};

/// Platforms are visible when public, to their members, and to managers.
/// The host platform can never be destroyed.
pub struct PlatformPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> PlatformPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Policy for PlatformPolicy<'_> {
    fn index(&self) -> bool {
        self.ctx.is_manager()
    }

    fn show(&self) -> bool {
        let own = self.ctx.record.as_joinable();
        self.ctx.record.privacy_public()
            || self.ctx.is_member_of(own.as_ref())
            || self.ctx.permitted_within(READ_PLATFORM, own.as_ref())
            || self.ctx.is_manager()
    }

    fn create(&self) -> bool {
        self.ctx.is_manager()
    }

    fn update(&self) -> bool {
        let own = self.ctx.record.as_joinable();
        self.ctx.permitted_within(UPDATE_PLATFORM, own.as_ref()) || self.ctx.is_manager()
    }

    fn destroy(&self) -> bool {
        self.ctx.destroyable() && !self.ctx.record.host && self.ctx.is_manager()
    }
}
