//! Visibility scopes for collection queries.
//!
//! # Purpose and responsibility
//! Narrows a base [`Query`] to the records an agent may list. This is the
//! query-side twin of [`Policy::show`](crate::Policy::show): every record a
//! resolved scope returns is one `show` would allow.
//!
//! # Key invariants and assumptions
//! - Anonymous agents see public records only.
//! - Unlisted records never appear in a scope result, whoever asks; they are
//!   reached by direct lookup alone.
//! - Resolution is pure: the base query is never modified and the result
//!   depends only on `(principal, base)`.
//!
//! # Examples
//! ```rust
//! use commons_authz::{Privacy, Query, Resource, ResourceType, Scope};
//!
//! let records = vec![
//!     Resource::new(ResourceType::Community, "open").with_privacy(Privacy::Public),
//!     Resource::new(ResourceType::Community, "closed"),
//! ];
//! let query = Scope::new(None, Query::all(ResourceType::Community)).resolve();
//! let visible = query.apply(&records);
//! assert_eq!(visible.len(), 1);
//! assert_eq!(visible[0].id.as_str(), "open");
//! ```
mod query;

pub use query::{Order, Predicate, Query};

use crate::permission::{
    INVITE_COMMUNITY_MEMBER, MANAGE_COMMUNITY_ROLES, UPDATE_COMMUNITY, UPDATE_PLATFORM,
};
use crate::{
    AuthzError, AuthzResult, Principal, Privacy, RecordId, ResourceType, is_platform_manager,
};

#[derive(Debug, Clone)]
pub struct Scope<'a> {
    principal: Option<&'a Principal>,
    base: Query,
}

impl<'a> Scope<'a> {
    pub fn new(principal: Option<&'a Principal>, base: Query) -> Self {
        Self { principal, base }
    }

    /// The visible subset of the base query, newest first unless the base
    /// already carries an ordering.
    pub fn resolve(&self) -> Query {
        let kind = self.base.kind();
        let resolved = self.base.and(visibility(kind, self.principal));
        tracing::trace!(
            agent = self.principal.map(|p| p.id().as_str()).unwrap_or("anonymous"),
            %kind,
            filter = ?resolved.filter(),
            "resolved scope"
        );
        match resolved.order() {
            Some(_) => resolved,
            None => resolved.ordered(Order::NewestFirst),
        }
    }
}

/// Privacy-aware visibility shared by every type that carries privacy:
/// public records, plus (for a present agent) the ones they created, the
/// containers they joined, and for managers every private record. Unlisted
/// records are excluded from every branch.
pub fn privacy_predicate(
    kind: ResourceType,
    principal: Option<&Principal>,
) -> AuthzResult<Predicate> {
    let traits = kind.traits();
    if !traits.privacy {
        return Err(AuthzError::PrivacyUnsupported(kind));
    }

    let public = Predicate::PrivacyIs(Privacy::Public);
    let Some(principal) = principal else {
        return Ok(public);
    };

    let mut visible = public;
    if traits.creator {
        visible = visible.or(Predicate::CreatorIs(principal.id().clone()));
    }
    if traits.joinable {
        visible = visible.or(Predicate::id_in(
            principal.joined(kind).map(|joinable| joinable.id.clone()),
        ));
    }
    if is_platform_manager(Some(principal)) {
        visible = visible.or(Predicate::PrivacyIs(Privacy::Private));
    }
    Ok(Predicate::Listed.and(visible))
}

/// Type-specific visibility for `kind`.
pub fn visibility(kind: ResourceType, principal: Option<&Principal>) -> Predicate {
    let manager = is_platform_manager(principal);
    match kind {
        ResourceType::Role | ResourceType::ResourcePermission => {
            if manager {
                Predicate::Always
            } else {
                Predicate::Never
            }
        }
        ResourceType::Invitation => match principal {
            _ if manager => Predicate::Always,
            None => Predicate::Never,
            Some(principal) => Predicate::SubjectIs(principal.id().clone())
                .or(Predicate::CreatorIs(principal.id().clone()))
                .or(Predicate::container_in(
                    principal
                        .containers_granting(INVITE_COMMUNITY_MEMBER)
                        .cloned(),
                )),
        },
        ResourceType::Membership => match principal {
            _ if manager => Predicate::Always,
            None => Predicate::Never,
            Some(principal) => {
                let managed = [UPDATE_COMMUNITY, MANAGE_COMMUNITY_ROLES, UPDATE_PLATFORM]
                    .into_iter()
                    .flat_map(|permission| principal.containers_granting(permission).cloned());
                Predicate::SubjectIs(principal.id().clone()).or(Predicate::container_in(managed))
            }
        },
        ResourceType::Person => with_extra(kind, principal, |principal| {
            Predicate::IdIn([RecordId::new(principal.id().as_str())].into())
        }),
        ResourceType::Event => with_extra(kind, principal, |principal| {
            Predicate::host_in(principal.all_joined().cloned())
                .or(Predicate::InviteeIs(principal.id().clone()))
        }),
        ResourceType::Platform
        | ResourceType::Community
        | ResourceType::Page
        | ResourceType::Post
        | ResourceType::Checklist
        | ResourceType::Upload => with_extra(kind, principal, |_| Predicate::Never),
    }
}

/// The privacy predicate widened by extra agent-specific branches, which
/// stay subject to the unlisted exclusion.
fn with_extra(
    kind: ResourceType,
    principal: Option<&Principal>,
    extra: impl FnOnce(&Principal) -> Predicate,
) -> Predicate {
    let base = match privacy_predicate(kind, principal) {
        Ok(predicate) => predicate,
        Err(err) => {
            tracing::warn!(%kind, error = %err, "privacy scope requested for privacy-less type");
            return Predicate::Never;
        }
    };
    match principal {
        Some(principal) => base.or(Predicate::Listed.and(extra(principal))),
        None => base,
    }
}
