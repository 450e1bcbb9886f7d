use super::{Policy, PolicyContext};
use crate::Action;
use crate::permission::{CREATE_PAGE, DESTROY_PAGE, UPDATE_PAGE};

/// Platform-level pages, managed through the `*_page` grants.
pub struct PagePolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> PagePolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Policy for PagePolicy<'_> {
    fn index(&self) -> bool {
        true
    }

    fn show(&self) -> bool {
        self.ctx.record.privacy_public()
            || self.ctx.is_creator()
            || self.ctx.permitted_to(UPDATE_PAGE)
            || self.ctx.is_manager()
    }

    fn create(&self) -> bool {
        self.ctx.permitted_to(CREATE_PAGE) || self.ctx.is_manager()
    }

    fn update(&self) -> bool {
        self.ctx.is_creator() || self.ctx.permitted_to(UPDATE_PAGE) || self.ctx.is_manager()
    }

    fn destroy(&self) -> bool {
        self.ctx.destroyable()
            && (self.ctx.is_creator()
                || self.ctx.permitted_to(DESTROY_PAGE)
                || self.ctx.is_manager())
    }

    fn perform(&self, action: Action) -> bool {
        matches!(action, Action::Publish) && self.update()
    }
}

/// Posts belong to whoever wrote them.
pub struct PostPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> PostPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Policy for PostPolicy<'_> {
    fn index(&self) -> bool {
        true
    }

    fn show(&self) -> bool {
        self.ctx.record.privacy_public() || self.ctx.is_creator() || self.ctx.is_manager()
    }

    fn create(&self) -> bool {
        self.ctx.agent_present()
    }

    fn update(&self) -> bool {
        self.ctx.is_creator() || self.ctx.is_manager()
    }

    fn destroy(&self) -> bool {
        self.ctx.destroyable() && self.update()
    }

    fn perform(&self, action: Action) -> bool {
        matches!(action, Action::Publish) && self.update()
    }
}
