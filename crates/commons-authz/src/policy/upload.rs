use super::{Policy, PolicyContext};

pub struct UploadPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> UploadPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Policy for UploadPolicy<'_> {
    fn index(&self) -> bool {
        self.ctx.agent_present()
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
}
