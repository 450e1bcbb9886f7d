//! Access-control kernel for the community platform.
//!
//! # Purpose
//! Decides who may see and change which records. The kernel is made of four
//! layers:
//! - a role/permission [`Catalog`] and a [`MembershipLedger`] binding agents
//!   to roles inside joinable containers,
//! - a [`Resolver`] answering "does this agent hold permission X",
//! - per-type [`Policy`] objects answering "may this agent do this to that
//!   record",
//! - [`Scope`] builders narrowing a collection [`Query`] to what the agent
//!   may list.
//!
//! # How it fits
//! Storage, HTTP, and caching live in the host service. The kernel only
//! consumes snapshots (catalog rows, an agent's memberships, records) and
//! returns booleans or pure query values.
//!
//! # Key invariants
//! - Denial is `false` (or an empty narrowing), never an error.
//! - Policy code references permissions by identifier only.
//! - An agent holds at most one membership per container.
//! - Unlisted records never surface through a scope.
//! - Protected records are never destroyable.
//!
//! # Examples
//! ```rust
//! use commons_authz::{
//!     authorize, Action, Agent, Catalog, JoinableRef, Membership, PermissionId, Privacy,
//!     Resolver, Resource, ResourcePermission, ResourceType, Role, RoleId, UPDATE_COMMUNITY,
//! };
//!
//! let mut catalog = Catalog::new();
//! catalog
//!     .add_role(Role {
//!         id: RoleId::new("facilitator"),
//!         identifier: "community_facilitator".into(),
//!         name: "Facilitator".into(),
//!         resource_type: ResourceType::Community,
//!         protected: true,
//!         position: 0,
//!     })
//!     .unwrap();
//! catalog
//!     .add_permission(ResourcePermission {
//!         id: PermissionId::new("update"),
//!         identifier: UPDATE_COMMUNITY.into(),
//!         resource_type: ResourceType::Community,
//!         protected: true,
//!         position: 0,
//!     })
//!     .unwrap();
//! catalog
//!     .assign(&RoleId::new("facilitator"), &PermissionId::new("update"))
//!     .unwrap();
//!
//! let agent = Agent::new("p1").with_membership(Membership::new(
//!     "p1",
//!     JoinableRef::community("c1"),
//!     "facilitator",
//! ));
//! let principal = Resolver::new(&catalog).principal(&agent);
//! let c1 = Resource::new(ResourceType::Community, "c1").with_privacy(Privacy::Private);
//! assert!(authorize(Some(&principal), &c1, Action::Update));
//! ```
//!
//! # Common pitfalls
//! - Resolving a [`Principal`] once and caching it across requests keeps
//!   revoked grants alive.
//! - Forgetting that `permitted_to` is global: a role held in one community
//!   passes the check everywhere. Use `permitted_within` for container-bound
//!   decisions.

mod action;
mod agent;
mod catalog;
mod errors;
mod ids;
mod membership;
pub mod permission;
mod policy;
mod privacy;
mod record;
mod resolver;
mod resource_type;
mod scope;

pub use action::Action;
pub use agent::Agent;
pub use catalog::{Catalog, ResourcePermission, Role, RoleResourcePermission};
pub use errors::{AuthzError, AuthzResult};
pub use ids::{AgentId, PermissionId, RecordId, RoleId};
pub use membership::{JoinableRef, Membership, MembershipLedger};
pub use permission::{
    BUILTIN_PERMISSIONS, CREATE_COMMUNITY, CREATE_PAGE, DESTROY_COMMUNITY, DESTROY_PAGE,
    INVITE_COMMUNITY_MEMBER, MANAGE_COMMUNITY_ROLES, MANAGE_PLATFORM, READ_COMMUNITY,
    READ_PLATFORM, UPDATE_COMMUNITY, UPDATE_PAGE, UPDATE_PLATFORM, canonical_permission,
};
pub use policy::{
    ChecklistPolicy, CommunityPolicy, EventPolicy, InvitationPolicy, MembershipPolicy, PagePolicy,
    PersonPolicy, PlatformPolicy, Policy, PolicyContext, PostPolicy, ResourcePermissionPolicy,
    RolePolicy, UploadPolicy, authorize, policy_for,
};
pub use privacy::Privacy;
pub use record::Resource;
pub use resolver::{Principal, Resolver, is_platform_manager};
pub use resource_type::{ResourceTraits, ResourceType};
pub use scope::{Order, Predicate, Query, Scope, privacy_predicate, visibility};
