use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use super::{
    firebase_provider::{FirebaseProvider, FirebaseProviderConfig},
    static_provider::{StaticProvider, StaticProviderConfig},
};
use crate::models::ProviderUser;

/// Configuration for the identity provider backing the session.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "firebase")]
    Firebase(FirebaseProviderConfig),
    #[serde(rename = "static")]
    Static(StaticProviderConfig),
}

/// Where the provider keeps its signed-in user between restarts.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persistence {
    /// Survives process restarts.
    #[default]
    #[serde(rename = "local")]
    Local,
    /// Lives only as long as the process.
    #[serde(rename = "in-memory")]
    InMemory,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("identity provider misconfigured: {0}")]
    Config(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] std::io::Error),
    #[error("malformed user record: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("identity provider unreachable: {0}")]
    Transport(String),
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),
}

/// The narrow surface the session mirror needs from an identity provider.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    fn get_name(&self) -> &str;
    fn get_type(&self) -> &str;

    /// Selects the persistence mode and restores any persisted user. The
    /// first auth-state event is emitted once this completes.
    async fn set_persistence(&self, mode: Persistence) -> Result<(), ProviderError>;

    /// Registers a listener for auth-state changes. The current state, if
    /// already known, is delivered as the first event.
    fn subscribe(&self) -> AuthStateSubscription;

    async fn sign_in_with_id_token(&self, id_token: &str) -> Result<ProviderUser, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Create an identity provider from a given config.
pub fn create_identity_provider(config: &ProviderConfig) -> Arc<dyn IdentityProvider> {
    match config {
        ProviderConfig::Firebase(cfg) => Arc::new(FirebaseProvider::new(cfg)),
        ProviderConfig::Static(cfg) => Arc::new(StaticProvider::new(cfg)),
    }
}

/// The provider-side view of who is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Persistence has not been restored yet; no event has been emitted.
    Unknown,
    Known(Option<ProviderUser>),
}

/// Broadcasts auth-state events to every subscription. Providers own one.
pub struct AuthStateChannel {
    sender: watch::Sender<AuthState>,
}

impl AuthStateChannel {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AuthState::Unknown);
        AuthStateChannel { sender }
    }

    /// Emits an event. Every call notifies subscribers, even when the user
    /// did not change.
    pub fn emit(&self, user: Option<ProviderUser>) {
        debug!(
            "Emitting auth-state event for {}",
            user.as_ref().map_or("<none>", |u| u.unique_id.as_str())
        );
        self.sender.send_replace(AuthState::Known(user));
    }

    pub fn current(&self) -> AuthState {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> AuthStateSubscription {
        AuthStateSubscription {
            receiver: self.sender.subscribe(),
            primed: false,
        }
    }
}

impl Default for AuthStateChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// A live registration on an [`AuthStateChannel`]. Dropping it unsubscribes.
pub struct AuthStateSubscription {
    receiver: watch::Receiver<AuthState>,
    primed: bool,
}

impl AuthStateSubscription {
    /// Waits for the next event. Returns `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<Option<ProviderUser>> {
        if !self.primed {
            self.primed = true;
            if let Some(user) = self.take_known() {
                return Some(user);
            }
        }
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(user) = self.take_known() {
                return Some(user);
            }
        }
    }

    pub fn unsubscribe(self) {}

    fn take_known(&mut self) -> Option<Option<ProviderUser>> {
        match &*self.receiver.borrow_and_update() {
            AuthState::Known(user) => Some(user.clone()),
            AuthState::Unknown => None,
        }
    }
}
