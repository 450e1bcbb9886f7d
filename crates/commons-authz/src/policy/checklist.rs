use super::{Policy, PolicyContext};

pub struct ChecklistPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> ChecklistPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Policy for ChecklistPolicy<'_> {
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
}

#[cfg(test)]
mod tests {
    use crate::policy::test_support::principal;
    use crate::{Action, Privacy, Resource, ResourceType, authorize};

    #[test]
    fn unlisted_checklist_reachable_only_by_creator() {
        let list = Resource::new(ResourceType::Checklist, "cl")
            .with_privacy(Privacy::Unlisted)
            .created_by("p1");
        assert!(authorize(Some(&principal("p1", &[])), &list, Action::Show));
        assert!(!authorize(Some(&principal("p2", &[])), &list, Action::Show));
        assert!(!authorize(None, &list, Action::Create));
    }
}
