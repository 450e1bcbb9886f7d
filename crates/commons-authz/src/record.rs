//! Protected record shape consumed by policies and scopes.
//!
//! # Purpose
//! A single, uniform view over any protected entity. Attributes a resource
//! type does not mix in stay `None`/empty; the [`ResourceType`] traits table
//! says which ones are meaningful.
//!
//! # Key invariants
//! - `privacy` is `Some` exactly when the type carries privacy.
//! - `published` is `Some` exactly when the type has a publish state.
//! - `container` names the joinable the record belongs to (a community's
//!   platform, an invitation's community, a membership's joinable).
//!
//! # Examples
//! ```rust
//! use commons_authz::{Privacy, Resource, ResourceType};
//!
//! let page = Resource::new(ResourceType::Page, "page-1")
//!     .with_privacy(Privacy::Public)
//!     .published(true)
//!     .created_by("person-1");
//! assert!(page.privacy_public());
//! assert!(page.is_published());
//! ```
use crate::{AgentId, JoinableRef, Privacy, RecordId, ResourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ResourceFields")]
pub struct Resource {
    pub kind: ResourceType,
    pub id: RecordId,
    pub privacy: Option<Privacy>,
    pub creator_id: Option<AgentId>,
    /// System/seed records that can never be destroyed.
    pub protected: bool,
    /// The host platform or host community of an installation.
    pub host: bool,
    pub published: Option<bool>,
    pub container: Option<JoinableRef>,
    /// Declared hosts of an event.
    pub hosts: Vec<JoinableRef>,
    /// The agent this record is about (a person record, an invitee, a member).
    pub subject_id: Option<AgentId>,
    pub invitees: Vec<AgentId>,
    pub created_at: DateTime<Utc>,
}

/// Wire shape of a [`Resource`]. Missing type-dependent attributes take the
/// same defaults as [`Resource::new`].
#[derive(Deserialize)]
struct ResourceFields {
    kind: ResourceType,
    id: RecordId,
    #[serde(default)]
    privacy: Option<Privacy>,
    #[serde(default)]
    creator_id: Option<AgentId>,
    #[serde(default)]
    protected: bool,
    #[serde(default)]
    host: bool,
    #[serde(default)]
    published: Option<bool>,
    #[serde(default)]
    container: Option<JoinableRef>,
    #[serde(default)]
    hosts: Vec<JoinableRef>,
    #[serde(default)]
    subject_id: Option<AgentId>,
    #[serde(default)]
    invitees: Vec<AgentId>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl From<ResourceFields> for Resource {
    fn from(fields: ResourceFields) -> Self {
        Resource {
            kind: fields.kind,
            id: fields.id,
            privacy: fields.privacy,
            creator_id: fields.creator_id,
            protected: fields.protected,
            host: fields.host,
            published: fields.published,
            container: fields.container,
            hosts: fields.hosts,
            subject_id: fields.subject_id,
            invitees: fields.invitees,
            created_at: fields.created_at,
        }
        .normalized()
    }
}

impl Resource {
    /// New record with type-appropriate defaults: `private` when the type
    /// carries privacy, unpublished when it has a publish state.
    pub fn new(kind: ResourceType, id: impl Into<RecordId>) -> Self {
        let traits = kind.traits();
        Self {
            kind,
            id: id.into(),
            privacy: traits.privacy.then_some(Privacy::Private),
            creator_id: None,
            protected: false,
            host: false,
            published: traits.publishable.then_some(false),
            container: None,
            hosts: Vec::new(),
            subject_id: None,
            invitees: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Bring type-dependent attributes in line with the type's traits:
    /// privacy defaults to `private` and publish state to unpublished where
    /// the type carries them, and both are cleared where it does not.
    pub fn normalized(mut self) -> Self {
        let traits = self.kind.traits();
        self.privacy = if traits.privacy {
            Some(self.privacy.unwrap_or(Privacy::Private))
        } else {
            None
        };
        self.published = if traits.publishable {
            Some(self.published.unwrap_or(false))
        } else {
            None
        };
        self
    }

    pub fn with_privacy(mut self, privacy: Privacy) -> Self {
        if self.kind.traits().privacy {
            self.privacy = Some(privacy);
        }
        self
    }

    pub fn created_by(mut self, agent: impl Into<AgentId>) -> Self {
        self.creator_id = Some(agent.into());
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn as_host(mut self) -> Self {
        self.host = true;
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        if self.kind.traits().publishable {
            self.published = Some(published);
        }
        self
    }

    pub fn in_container(mut self, container: JoinableRef) -> Self {
        self.container = Some(container);
        self
    }

    pub fn hosted_by(mut self, host: JoinableRef) -> Self {
        self.hosts.push(host);
        self
    }

    pub fn about(mut self, agent: impl Into<AgentId>) -> Self {
        self.subject_id = Some(agent.into());
        self
    }

    pub fn inviting(mut self, agent: impl Into<AgentId>) -> Self {
        self.invitees.push(agent.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn privacy_public(&self) -> bool {
        self.privacy == Some(Privacy::Public)
    }

    pub fn privacy_private(&self) -> bool {
        self.privacy == Some(Privacy::Private)
    }

    /// Types without a publish state count as published.
    pub fn is_published(&self) -> bool {
        self.published.unwrap_or(true)
    }

    pub fn is_created_by(&self, agent: &AgentId) -> bool {
        self.creator_id.as_ref() == Some(agent)
    }

    pub fn is_about(&self, agent: &AgentId) -> bool {
        self.subject_id.as_ref() == Some(agent)
    }

    pub fn is_invited(&self, agent: &AgentId) -> bool {
        self.invitees.contains(agent)
    }

    /// This record as a membership container, when its type is joinable.
    pub fn as_joinable(&self) -> Option<JoinableRef> {
        self.kind.is_joinable().then(|| JoinableRef {
            kind: self.kind,
            id: self.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_type_traits() {
        let page = Resource::new(ResourceType::Page, "p");
        assert_eq!(page.privacy, Some(Privacy::Private));
        assert_eq!(page.published, Some(false));
        assert!(!page.is_published());

        let role = Resource::new(ResourceType::Role, "r").with_privacy(Privacy::Public);
        assert_eq!(role.privacy, None);
        assert_eq!(role.published, None);
        assert!(role.is_published());
    }

    #[test]
    fn joinable_records_expose_their_container_ref() {
        let community = Resource::new(ResourceType::Community, "c1");
        assert_eq!(community.as_joinable(), Some(JoinableRef::community("c1")));
        assert_eq!(Resource::new(ResourceType::Event, "e1").as_joinable(), None);
    }

    #[test]
    fn relationship_helpers() {
        let agent = AgentId::new("p1");
        let event = Resource::new(ResourceType::Event, "e1")
            .created_by("p2")
            .inviting("p1");
        assert!(event.is_invited(&agent));
        assert!(!event.is_created_by(&agent));
        assert!(event.is_created_by(&AgentId::new("p2")));
    }

    #[test]
    fn missing_privacy_defaults_like_new() {
        let community: Resource =
            serde_json::from_str(r#"{"kind":"community","id":"c1","creator_id":"p1"}"#)
                .expect("deserialize");
        assert_eq!(community.privacy, Some(Privacy::Private));

        let page: Resource =
            serde_json::from_str(r#"{"kind":"page","id":"p","privacy":"public"}"#)
                .expect("deserialize");
        assert_eq!(page.privacy, Some(Privacy::Public));
        assert_eq!(page.published, Some(false));

        let role: Resource =
            serde_json::from_str(r#"{"kind":"role","id":"r","privacy":"public","published":true}"#)
                .expect("deserialize");
        assert_eq!(role.privacy, None);
        assert_eq!(role.published, None);
    }
}
