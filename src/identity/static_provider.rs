use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::identity::{
    AuthStateChannel, AuthStateSubscription, IdentityProvider, Persistence, ProviderError,
};
use crate::models::ProviderUser;

/// StaticProviderConfig defines a fixed set of accounts, for local
/// development and tests.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct StaticProviderConfig {
    /// A friendly name for logs.
    pub name: String,
    /// Accounts that can sign in, each with the token that selects it.
    pub users: Vec<StaticUserEntry>,
    /// The uid of the account treated as already signed in at start.
    pub signed_in: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct StaticUserEntry {
    pub token: String,
    pub uid: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl StaticUserEntry {
    fn to_provider_user(&self) -> ProviderUser {
        ProviderUser::new(
            self.uid.clone(),
            self.display_name.clone(),
            self.photo_url.clone(),
        )
    }
}

pub struct StaticProvider {
    config: StaticProviderConfig,
    channel: AuthStateChannel,
}

impl StaticProvider {
    pub fn new(config: &StaticProviderConfig) -> Self {
        Self {
            config: config.clone(),
            channel: AuthStateChannel::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticProvider {
    fn get_name(&self) -> &str {
        &self.config.name
    }

    fn get_type(&self) -> &str {
        "static"
    }

    /// Nothing is stored, so every mode restores the configured `signed_in`
    /// account.
    async fn set_persistence(&self, mode: Persistence) -> Result<(), ProviderError> {
        let restored = match &self.config.signed_in {
            Some(uid) => Some(
                self.config
                    .users
                    .iter()
                    .find(|entry| &entry.uid == uid)
                    .map(StaticUserEntry::to_provider_user)
                    .ok_or_else(|| {
                        ProviderError::Config(format!(
                            "signed_in uid '{}' is not a configured user",
                            uid
                        ))
                    })?,
            ),
            None => None,
        };
        debug!("Static provider '{}' set to {:?} persistence", self.config.name, mode);
        self.channel.emit(restored);
        Ok(())
    }

    fn subscribe(&self) -> AuthStateSubscription {
        self.channel.subscribe()
    }

    async fn sign_in_with_id_token(&self, id_token: &str) -> Result<ProviderUser, ProviderError> {
        let user = self
            .config
            .users
            .iter()
            .find(|entry| entry.token == id_token)
            .map(StaticUserEntry::to_provider_user)
            .ok_or_else(|| ProviderError::Rejected("unknown token".into()))?;

        info!(
            "Static provider '{}' signed in user '{}'",
            self.config.name, user.unique_id
        );
        self.channel.emit(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.channel.emit(None);
        Ok(())
    }
}
