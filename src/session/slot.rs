use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::models::SessionState;

/// What the slot knows about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The provider has not delivered its first event yet.
    Loading,
    /// The provider could not be initialized; login state is undeterminable.
    Unavailable(String),
    Resolved(SessionState),
}

impl Readiness {
    pub fn is_loading(&self) -> bool {
        matches!(self, Readiness::Loading)
    }

    /// The session, treating anything unresolved as signed out.
    pub fn session(&self) -> Option<&crate::models::SessionUser> {
        match self {
            Readiness::Resolved(state) => state.as_ref(),
            Readiness::Loading | Readiness::Unavailable(_) => None,
        }
    }
}

/// Observable holder of the current [`Readiness`]. Clones share the slot.
#[derive(Clone)]
pub struct SessionSlot {
    sender: Arc<watch::Sender<Readiness>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Readiness::Loading);
        SessionSlot {
            sender: Arc::new(sender),
        }
    }

    pub fn get(&self) -> Readiness {
        self.sender.borrow().clone()
    }

    /// Replaces the published session. Returns `false` (and notifies nobody)
    /// when the slot already held exactly this state.
    pub fn publish(&self, state: SessionState) -> bool {
        let next = Readiness::Resolved(state);
        self.sender.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    pub fn mark_unavailable(&self, reason: impl Into<String>) {
        self.sender.send_replace(Readiness::Unavailable(reason.into()));
    }

    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.sender.subscribe()
    }

    /// Waits until the slot leaves `Loading`, or until `limit` elapses, and
    /// returns whatever it holds at that point.
    pub async fn wait_ready(&self, limit: Duration) -> Readiness {
        self.wait_until(|readiness| !readiness.is_loading(), limit)
            .await;
        self.get()
    }

    /// Waits until `predicate` holds for the slot's value. Returns `false` if
    /// `limit` elapsed first.
    pub async fn wait_until<F>(&self, mut predicate: F, limit: Duration) -> bool
    where
        F: FnMut(&Readiness) -> bool,
    {
        let mut receiver = self.sender.subscribe();
        let reached = matches!(
            tokio::time::timeout(limit, receiver.wait_for(|r| predicate(r))).await,
            Ok(Ok(_))
        );
        reached
    }
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self::new()
    }
}
