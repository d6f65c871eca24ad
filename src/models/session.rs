use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::provider_user::ProviderUser;

/// The minimal identity published to the rest of the application.
///
/// `subject_id` is never empty; a provider user without an id cannot be
/// turned into a `SessionUser`.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub subject_id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// `None` means nobody is signed in.
pub type SessionState = Option<SessionUser>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("provider user has an empty unique id")]
pub struct EmptySubjectId;

impl SessionUser {
    pub fn new(
        subject_id: impl Into<String>,
        display_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<Self, EmptySubjectId> {
        let subject_id = subject_id.into();
        if subject_id.trim().is_empty() {
            return Err(EmptySubjectId);
        }
        Ok(SessionUser {
            subject_id,
            display_name,
            avatar_url,
        })
    }
}

impl TryFrom<ProviderUser> for SessionUser {
    type Error = EmptySubjectId;

    fn try_from(user: ProviderUser) -> Result<Self, Self::Error> {
        SessionUser::new(user.unique_id, user.display_name, user.photo_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_provider_fields() {
        let provider_user = ProviderUser::new(
            "u1",
            Some("Ana".to_string()),
            Some("https://example.com/ana.png".to_string()),
        );

        let user = SessionUser::try_from(provider_user).unwrap();
        assert_eq!(user.subject_id, "u1");
        assert_eq!(user.display_name.as_deref(), Some("Ana"));
        assert_eq!(user.avatar_url.as_deref(), Some("https://example.com/ana.png"));
    }

    #[test]
    fn test_rejects_empty_subject_id() {
        assert_eq!(
            SessionUser::try_from(ProviderUser::new("  ", None, None)),
            Err(EmptySubjectId)
        );
    }
}
