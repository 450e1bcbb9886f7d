//! Three-valued privacy classification.
//!
//! # Key invariants
//! - `Public` records are listed and visible to everyone.
//! - `Private` records are visible only through an explicit grant
//!   (membership, ownership, or the manager permission).
//! - `Unlisted` records never appear in a scope; they are reachable only by a
//!   direct `show` check on a known identifier.
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    Public,
    #[default]
    Private,
    Unlisted,
}

impl Privacy {
    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
        }
    }

    pub fn is_public(self) -> bool {
        self == Privacy::Public
    }

    pub fn is_private(self) -> bool {
        self == Privacy::Private
    }

    pub fn is_unlisted(self) -> bool {
        self == Privacy::Unlisted
    }
}

impl std::fmt::Display for Privacy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Privacy {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        match value {
            "public" => Ok(Privacy::Public),
            "private" => Ok(Privacy::Private),
            "unlisted" => Ok(Privacy::Unlisted),
            other => Err(AuthzError::InvalidPrivacy(other.to_string())),
        }
    }
}
