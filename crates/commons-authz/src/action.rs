use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

/// Decision methods a policy can answer.
///
/// The first seven mirror the conventional CRUD pairs (`new` renders the form
/// for `create`, `edit` for `update`); the rest are resource-specific actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Index,
    Show,
    New,
    Create,
    Edit,
    Update,
    Destroy,
    Join,
    Leave,
    Publish,
    Resend,
    Accept,
    Decline,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::Index,
        Action::Show,
        Action::New,
        Action::Create,
        Action::Edit,
        Action::Update,
        Action::Destroy,
        Action::Join,
        Action::Leave,
        Action::Publish,
        Action::Resend,
        Action::Accept,
        Action::Decline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::Show => "show",
            Action::New => "new",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::Join => "join",
            Action::Leave => "leave",
            Action::Publish => "publish",
            Action::Resend => "resend",
            Action::Accept => "accept",
            Action::Decline => "decline",
        }
    }

    /// Whether this is one of the resource-specific actions routed to
    /// [`Policy::perform`](crate::Policy::perform).
    pub fn is_custom(self) -> bool {
        matches!(
            self,
            Action::Join
                | Action::Leave
                | Action::Publish
                | Action::Resend
                | Action::Accept
                | Action::Decline
        )
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        // Accept the predicate spelling (`show?`) used by callers that mirror
        // decision-method names.
        let trimmed = value.strip_suffix('?').unwrap_or(value);
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == trimmed)
            .ok_or_else(|| AuthzError::InvalidAction(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::Action;

    #[test]
    fn action_string_roundtrip() {
        for action in Action::ALL {
            let as_str = action.as_str();
            assert_eq!(as_str.parse::<Action>().ok(), Some(action));
            assert_eq!(action.to_string(), as_str);
        }
    }

    #[test]
    fn action_accepts_predicate_suffix() {
        assert_eq!("destroy?".parse::<Action>().ok(), Some(Action::Destroy));
    }

    #[test]
    fn action_from_str_invalid() {
        assert!("archive".parse::<Action>().is_err());
        assert!("show??".parse::<Action>().is_err());
    }

    #[test]
    fn crud_actions_are_not_custom() {
        assert!(!Action::Show.is_custom());
        assert!(!Action::Edit.is_custom());
        assert!(Action::Join.is_custom());
    }
}
