//! Closed set of protected resource types and their static traits table.
//!
//! # Purpose
//! Replaces open-ended "type name -> class" resolution with an enum and a
//! lookup table. Scopes consult the table before composing predicates, so a
//! privacy filter is never applied to a type that lacks the attribute.
//!
//! # Key invariants
//! - [`ResourceType::from_str`] is the only string entry point and accepts
//!   exactly the canonical names listed in [`ResourceType::ALL`].
//! - A joinable type owns a membership ledger; non-joinable types never appear
//!   as a [`JoinableRef`](crate::JoinableRef) kind.
//!
//! # Examples
//! ```rust
//! use commons_authz::ResourceType;
//!
//! let kind: ResourceType = "community".parse().expect("known type");
//! assert!(kind.traits().joinable);
//! assert!(kind.traits().privacy);
//! ```
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Platform,
    Community,
    Person,
    Event,
    Page,
    Post,
    Checklist,
    Invitation,
    Upload,
    Role,
    ResourcePermission,
    Membership,
}

/// Which shared attributes a resource type mixes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTraits {
    /// Carries a [`Privacy`](crate::Privacy) attribute.
    pub privacy: bool,
    /// Records the authoring agent in `creator_id`.
    pub creator: bool,
    /// Owns a membership ledger.
    pub joinable: bool,
    /// Has a publish state.
    pub publishable: bool,
}

const fn traits(privacy: bool, creator: bool, joinable: bool, publishable: bool) -> ResourceTraits {
    ResourceTraits {
        privacy,
        creator,
        joinable,
        publishable,
    }
}

impl ResourceType {
    pub const ALL: [ResourceType; 12] = [
        ResourceType::Platform,
        ResourceType::Community,
        ResourceType::Person,
        ResourceType::Event,
        ResourceType::Page,
        ResourceType::Post,
        ResourceType::Checklist,
        ResourceType::Invitation,
        ResourceType::Upload,
        ResourceType::Role,
        ResourceType::ResourcePermission,
        ResourceType::Membership,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Platform => "platform",
            ResourceType::Community => "community",
            ResourceType::Person => "person",
            ResourceType::Event => "event",
            ResourceType::Page => "page",
            ResourceType::Post => "post",
            ResourceType::Checklist => "checklist",
            ResourceType::Invitation => "invitation",
            ResourceType::Upload => "upload",
            ResourceType::Role => "role",
            ResourceType::ResourcePermission => "resource_permission",
            ResourceType::Membership => "membership",
        }
    }

    pub fn traits(self) -> ResourceTraits {
        match self {
            ResourceType::Platform => traits(true, false, true, false),
            ResourceType::Community => traits(true, true, true, false),
            ResourceType::Person => traits(true, false, false, false),
            ResourceType::Event => traits(true, true, false, true),
            ResourceType::Page => traits(true, true, false, true),
            ResourceType::Post => traits(true, true, false, true),
            ResourceType::Checklist => traits(true, true, false, false),
            ResourceType::Invitation => traits(false, true, false, false),
            ResourceType::Upload => traits(true, true, false, false),
            ResourceType::Role => traits(false, false, false, false),
            ResourceType::ResourcePermission => traits(false, false, false, false),
            ResourceType::Membership => traits(false, false, false, false),
        }
    }

    pub fn is_joinable(self) -> bool {
        self.traits().joinable
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        ResourceType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AuthzError::UnknownResourceType(value.to_string()))
    }
}
