use crate::ResourceType;
use thiserror::Error;

/// Errors raised by the kernel.
///
/// None of these represent a policy denial: denial is always a plain `false`
/// or an empty narrowing. These are catalog/ledger integrity violations and
/// programming errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("invalid privacy: {0}")]
    InvalidPrivacy(String),
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("resource type {0} does not carry a privacy attribute")]
    PrivacyUnsupported(ResourceType),
    #[error("resource type {0} is not joinable")]
    NotJoinable(ResourceType),
    #[error("role {role} is scoped to {role_type} containers and cannot be held in {joinable}")]
    RoleOutOfScope {
        role: String,
        role_type: ResourceType,
        joinable: String,
    },
}

pub type AuthzResult<T> = Result<T, AuthzError>;
