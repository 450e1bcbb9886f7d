use super::{Policy, PolicyContext};

/// People manage their own profile; managers manage everyone else's.
pub struct PersonPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> PersonPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }

    fn is_self(&self) -> bool {
        self.ctx
            .agent()
            .is_some_and(|agent| agent.is_record(&self.ctx.record.id))
    }
}

impl Policy for PersonPolicy<'_> {
    fn index(&self) -> bool {
        self.ctx.is_manager()
    }

    fn show(&self) -> bool {
        self.ctx.record.privacy_public() || self.is_self() || self.ctx.is_manager()
    }

    fn create(&self) -> bool {
        self.ctx.is_manager()
    }

    fn update(&self) -> bool {
        self.is_self() || self.ctx.is_manager()
    }

    fn destroy(&self) -> bool {
        self.ctx.destroyable() && !self.is_self() && self.ctx.is_manager()
    }
}
