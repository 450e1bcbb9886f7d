//! Strongly typed identifiers for kernel entities.
//!
//! # Purpose
//! Wraps string identifiers to reduce accidental mix-ups between agents,
//! protected records, roles, and permission rows.
//!
//! # How it fits
//! These types flow through the catalog, the membership ledger, the resolver,
//! and every policy/scope so that an `AgentId` can never be compared against a
//! `RecordId` by accident.
//!
//! # Key invariants
//! - Each wrapper preserves the inner string exactly.
//! - Equality is plain string equality; stores decide the id format.
//!
//! # Examples
//! ```rust
//! use commons_authz::{AgentId, RecordId};
//!
//! let agent = AgentId::new("person-1");
//! let record = RecordId::new("community-9");
//! assert_eq!(format!("{agent}/{record}"), "person-1/community-9");
//! ```
//!
//! # Common pitfalls
//! - A person record's `RecordId` and the acting `AgentId` share the same raw
//!   value; compare them through [`AgentId::is_record`], not by formatting.
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Construct a new identifier wrapper.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Access the inner identifier string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Acting identity (a person) evaluated by the kernel.
    ///
    /// # Example
    /// ```rust
    /// use commons_authz::AgentId;
    ///
    /// let agent = AgentId::new("person-1");
    /// assert_eq!(agent.as_str(), "person-1");
    /// ```
    AgentId
);

string_id!(
    /// Identifier of a protected record (community, event, page, ...).
    RecordId
);

string_id!(
    /// Stable identifier of a catalog role row.
    RoleId
);

string_id!(
    /// Stable identifier of a catalog resource-permission row.
    PermissionId
);

impl AgentId {
    /// Whether this agent is the record identified by `record`.
    ///
    /// Person records share their identifier with the acting agent.
    pub fn is_record(&self, record: &RecordId) -> bool {
        self.0 == record.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_and_display() {
        let agent = AgentId::new("person-1");
        let record = RecordId::from("community-1");
        let role = RoleId::new("community_facilitator");
        let permission = PermissionId::new("perm-7");

        assert_eq!(agent.as_str(), "person-1");
        assert_eq!(record.to_string(), "community-1");
        assert_eq!(role.as_str(), "community_facilitator");
        assert_eq!(permission.to_string(), "perm-7");
    }

    #[test]
    fn agent_matches_its_person_record() {
        let agent = AgentId::new("person-1");
        assert!(agent.is_record(&RecordId::new("person-1")));
        assert!(!agent.is_record(&RecordId::new("person-2")));
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&AgentId::new("person-1")).expect("serialize");
        assert_eq!(json, "\"person-1\"");
    }
}
