use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A user record as the identity provider spells it.
///
/// This is both the shape returned by the Firebase `accounts:lookup` call and
/// the record kept on disk for durable local persistence.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    #[serde(rename = "localId")]
    pub unique_id: String,
    #[serde(rename = "displayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "photoUrl", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl ProviderUser {
    pub fn new(
        unique_id: impl Into<String>,
        display_name: Option<String>,
        photo_url: Option<String>,
    ) -> Self {
        ProviderUser {
            unique_id: unique_id.into(),
            display_name,
            photo_url,
        }
    }
}
