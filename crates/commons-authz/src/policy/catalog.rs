use super::{Policy, PolicyContext};

/// Catalog rows are manager-only. Protected rows are read-only.
fn manage_catalog(ctx: &PolicyContext<'_>) -> bool {
    ctx.is_manager()
}

pub struct RolePolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> RolePolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Policy for RolePolicy<'_> {
    fn index(&self) -> bool {
        manage_catalog(&self.ctx)
    }

    fn show(&self) -> bool {
        manage_catalog(&self.ctx)
    }

    fn create(&self) -> bool {
        manage_catalog(&self.ctx)
    }

    fn update(&self) -> bool {
        self.ctx.destroyable() && manage_catalog(&self.ctx)
    }

    fn destroy(&self) -> bool {
        self.ctx.destroyable() && manage_catalog(&self.ctx)
    }
}

pub struct ResourcePermissionPolicy<'a> {
    ctx: PolicyContext<'a>,
}

impl<'a> ResourcePermissionPolicy<'a> {
    pub fn new(ctx: PolicyContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Policy for ResourcePermissionPolicy<'_> {
    fn index(&self) -> bool {
        manage_catalog(&self.ctx)
    }

    fn show(&self) -> bool {
        manage_catalog(&self.ctx)
    }

    fn create(&self) -> bool {
        manage_catalog(&self.ctx)
    }

    fn update(&self) -> bool {
        self.ctx.destroyable() && manage_catalog(&self.ctx)
    }

    fn destroy(&self) -> bool {
        self.ctx.destroyable() && manage_catalog(&self.ctx)
    }
}

#[cfg(test)]
mod tests {
    use crate::policy::test_support::{manager, principal};
    use crate::{Action, JoinableRef, Resource, ResourceType, authorize};

    #[test]
    fn seeded_rows_are_read_only() {
        let admin = manager();
        for kind in [ResourceType::Role, ResourceType::ResourcePermission] {
            let seeded = Resource::new(kind, "seeded").protected();
            let custom = Resource::new(kind, "custom");
            assert!(authorize(Some(&admin), &seeded, Action::Show), "{kind}");
            assert!(!authorize(Some(&admin), &seeded, Action::Update), "{kind}");
            assert!(authorize(Some(&admin), &custom, Action::Destroy), "{kind}");
        }
    }

    #[test]
    fn community_roles_do_not_open_the_catalog() {
        let council = principal(
            "p1",
            &[(JoinableRef::community("c1"), "community_governance_council")],
        );
        let role = Resource::new(ResourceType::Role, "r");
        assert!(!authorize(Some(&council), &role, Action::Index));
        assert!(!authorize(Some(&council), &role, Action::Create));
    }
}
