//! Health check endpoints.

use crate::session::Readiness;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Returns 200 once the session is known. While the provider is still
/// loading, or failed to initialize, the service is reported unavailable.
async fn health_check(State(state): State<AppState>) -> Response {
    match state.slot.get() {
        Readiness::Resolved(_) => (StatusCode::OK, "OK").into_response(),
        Readiness::Loading => (StatusCode::SERVICE_UNAVAILABLE, "Starting").into_response(),
        Readiness::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Authentication unavailable",
        )
            .into_response(),
    }
}
