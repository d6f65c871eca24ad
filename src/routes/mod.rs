//! HTTP route definitions and handlers.
//!
//! The API routes (health and session) are never guarded. Every other path
//! falls through to the static site, which sits behind the navigation guard.

mod health_routes;
mod page_routes;
mod session_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    let pages = page_routes::routes(state.clone());

    Router::new()
        .merge(health_routes::routes())
        .merge(session_routes::routes())
        .with_state(state)
        .fallback_service(pages)
        .layer(TraceLayer::new_for_http())
}
