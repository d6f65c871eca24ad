use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::slot::SessionSlot;
use crate::identity::{AuthStateSubscription, IdentityProvider, Persistence, ProviderError};
use crate::models::{ProviderUser, SessionState, SessionUser};

/// Settings for bringing the session up at boot.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub persistence: Persistence,
    /// Give up on the provider's first event after this long. Waits
    /// indefinitely when unset.
    pub initial_event_timeout_ms: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderInitError {
    #[error("failed to configure identity provider: {0}")]
    Persistence(#[source] ProviderError),
    #[error("auth-state stream closed before its first event")]
    StreamClosed,
    #[error("no auth-state event within {0} ms")]
    Timeout(u64),
}

/// Keeps a [`SessionSlot`] in step with an identity provider.
///
/// Owns the provider subscription through a background task. The task stops
/// on [`SessionMirror::shutdown`], when the handle is dropped, or when the
/// provider goes away.
pub struct SessionMirror {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

/// Translates one provider event into the state published on the slot.
fn to_session_state(event: Option<ProviderUser>) -> SessionState {
    let user = event?;
    match SessionUser::try_from(user) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!("Publishing signed-out state: {}", e);
            None
        }
    }
}

fn apply(slot: &SessionSlot, event: Option<ProviderUser>) {
    let state = to_session_state(event);
    let subject = state
        .as_ref()
        .map_or("<none>".to_string(), |u| u.subject_id.clone());
    if slot.publish(state) {
        info!("Session changed; subject is now {}", subject);
    } else {
        debug!("Auth-state event did not change the session ({})", subject);
    }
}

impl SessionMirror {
    /// Configures provider persistence, subscribes to auth-state changes and
    /// waits for the first event before returning. The slot holds a resolved
    /// session once this succeeds.
    pub async fn initialize(
        provider: Arc<dyn IdentityProvider>,
        slot: SessionSlot,
        config: &SessionConfig,
    ) -> Result<Self, ProviderInitError> {
        info!(
            "Initializing session from provider '{}' ({})",
            provider.get_name(),
            provider.get_type()
        );
        provider
            .set_persistence(config.persistence)
            .await
            .map_err(ProviderInitError::Persistence)?;

        let mut subscription = provider.subscribe();
        let first = match config.initial_event_timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), subscription.next())
                .await
                .map_err(|_| ProviderInitError::Timeout(ms))?,
            None => subscription.next().await,
        }
        .ok_or(ProviderInitError::StreamClosed)?;
        apply(&slot, first);

        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(follow(subscription, slot, shutdown_rx));

        Ok(SessionMirror {
            shutdown: Some(shutdown),
            task,
        })
    }

    /// Cancels the subscription and waits for the background task to finish.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = self.task.await {
            error!("Session mirror task failed: {}", e);
        }
    }
}

async fn follow(
    mut subscription: AuthStateSubscription,
    slot: SessionSlot,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("Session mirror stopping");
                break;
            }
            event = subscription.next() => match event {
                Some(event) => apply(&slot, event),
                None => {
                    warn!("Identity provider closed its auth-state stream");
                    break;
                }
            },
        }
    }
    subscription.unsubscribe();
}
