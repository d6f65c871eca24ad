use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::identity::{
    AuthStateChannel, AuthStateSubscription, IdentityProvider, Persistence, ProviderError,
};
use crate::models::ProviderUser;

fn default_endpoint() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_persistence_path() -> PathBuf {
    PathBuf::from(".sessiongate/user.json")
}

/// Config for a Firebase Authentication project reached over its REST API.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct FirebaseProviderConfig {
    pub name: String,
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: Option<String>,
    /// Base URL of the Identity Toolkit API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Where the signed-in user is kept under `local` persistence.
    #[serde(default = "default_persistence_path")]
    pub persistence_path: PathBuf,
}

/// Firebase-backed identity provider.
///
/// Sign-in resolves an ID token to its account through `accounts:lookup`.
/// Under `local` persistence the resulting user record is written to disk and
/// restored on the next start.
pub struct FirebaseProvider {
    config: FirebaseProviderConfig,
    client: reqwest::Client,
    persistence: Mutex<Option<Persistence>>,
    channel: AuthStateChannel,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<ProviderUser>,
}

impl FirebaseProvider {
    pub fn new(config: &FirebaseProviderConfig) -> Self {
        info!(
            "Creating FirebaseProvider '{}' for project '{}'",
            config.name, config.project_id
        );
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
            persistence: Mutex::new(None),
            channel: AuthStateChannel::new(),
        }
    }

    fn validate(&self) -> Result<(), ProviderError> {
        if self.config.api_key.trim().is_empty() {
            return Err(ProviderError::Config("api_key is empty".into()));
        }
        if self.config.project_id.trim().is_empty() {
            return Err(ProviderError::Config("project_id is empty".into()));
        }
        Ok(())
    }

    fn mode(&self) -> Option<Persistence> {
        *self
            .persistence
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn lookup(&self, id_token: &str) -> Result<ProviderUser, ProviderError> {
        let url = format!(
            "{}/v1/accounts:lookup",
            self.config.endpoint.trim_end_matches('/')
        );
        debug!("Looking up Firebase account at '{}'", url);

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Transport(format!("failed to read lookup body: {}", e)))?;

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ProviderError::Rejected(message));
        }

        let parsed: LookupResponse = serde_json::from_value(body)?;
        parsed
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Rejected("no account for token".into()))
    }
}

async fn read_record(path: &Path) -> Result<Option<ProviderUser>, ProviderError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_record(path: &Path, user: &ProviderUser) -> Result<(), ProviderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_vec_pretty(user)?).await?;
    Ok(())
}

async fn remove_record(path: &Path) -> Result<(), ProviderError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseProvider {
    fn get_name(&self) -> &str {
        &self.config.name
    }

    fn get_type(&self) -> &str {
        "firebase"
    }

    async fn set_persistence(&self, mode: Persistence) -> Result<(), ProviderError> {
        self.validate()?;

        let restored = match mode {
            Persistence::Local => read_record(&self.config.persistence_path).await?,
            Persistence::InMemory => None,
        };
        *self
            .persistence
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(mode);

        info!(
            "Firebase provider '{}' using {:?} persistence; restored user: {}",
            self.config.name,
            mode,
            restored.as_ref().map_or("<none>", |u| u.unique_id.as_str())
        );
        self.channel.emit(restored);
        Ok(())
    }

    fn subscribe(&self) -> AuthStateSubscription {
        self.channel.subscribe()
    }

    async fn sign_in_with_id_token(&self, id_token: &str) -> Result<ProviderUser, ProviderError> {
        let user = self.lookup(id_token).await?;

        if self.mode() == Some(Persistence::Local) {
            write_record(&self.config.persistence_path, &user).await?;
        }

        info!(
            "Firebase provider '{}' signed in user '{}'",
            self.config.name, user.unique_id
        );
        self.channel.emit(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if self.mode() == Some(Persistence::Local) {
            if let Err(e) = remove_record(&self.config.persistence_path).await {
                warn!("Failed to remove persisted user record: {}", e);
                return Err(e);
            }
        }
        info!("Firebase provider '{}' signed out", self.config.name);
        self.channel.emit(None);
        Ok(())
    }
}
