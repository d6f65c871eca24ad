//! Application startup and server initialization.
//!
//! Brings the session up from the identity provider before the listener is
//! bound, so no navigation is ever guarded against an unknown session.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ConfigV1;
use crate::identity::create_identity_provider;
use crate::routes;
use crate::session::{SessionMirror, SessionSlot};
use crate::state::AppState;

/// Builds the shared state and mirrors the provider's session into it.
///
/// A provider that fails to initialize does not stop the service: the slot
/// is marked unavailable, every protected page redirects to login, and the
/// health and session endpoints report the failure.
pub async fn bootstrap(config: Arc<ConfigV1>) -> (AppState, Option<SessionMirror>) {
    let provider = create_identity_provider(&config.provider);
    let slot = SessionSlot::new();

    let mirror = match SessionMirror::initialize(provider.clone(), slot.clone(), &config.session)
        .await
    {
        Ok(mirror) => Some(mirror),
        Err(e) => {
            error!("Authentication unavailable: {}", e);
            slot.mark_unavailable(e.to_string());
            None
        }
    };

    (AppState::new(config, provider, slot), mirror)
}

/// Initializes and runs the application server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the specified address
/// or encounters a runtime error during execution.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let (state, mirror) = bootstrap(config.clone()).await;
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Serving '{}' on {}", config.site.root.display(), config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(mirror) = mirror {
        mirror.shutdown().await;
    }
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
