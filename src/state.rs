//! Shared application state.
//!
//! Contains the state that is shared across all request handlers: the
//! configuration, the identity provider, the session slot and the guard.

use crate::config::ConfigV1;
use crate::guard::RouteGuard;
use crate::identity::IdentityProvider;
use crate::session::SessionSlot;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Identity provider used for sign-in and sign-out.
    pub provider: Arc<dyn IdentityProvider>,
    /// The published session; written only by the session mirror.
    pub slot: SessionSlot,
    pub guard: Arc<RouteGuard>,
}

impl AppState {
    pub fn new(
        config: Arc<ConfigV1>,
        provider: Arc<dyn IdentityProvider>,
        slot: SessionSlot,
    ) -> Self {
        let guard = Arc::new(RouteGuard::new(&config.guard));
        AppState {
            config,
            provider,
            slot,
            guard,
        }
    }
}
