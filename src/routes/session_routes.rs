//! Session inspection, sign-in and sign-out.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::models::SessionUser;
use crate::session::Readiness;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Registers session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/session",
            get(get_session).post(sign_in).delete(sign_out),
        )
        .route("/api/me", get(me))
}

#[derive(Deserialize)]
struct SignInRequest {
    id_token: String,
}

/// Reports the session as the rest of the application sees it.
async fn get_session(State(state): State<AppState>) -> Result<Response, HTTPError> {
    match state.slot.get() {
        Readiness::Resolved(user) => {
            Ok(Json(json!({ "status": "resolved", "user": user })).into_response())
        }
        Readiness::Loading => Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "loading" })),
        )
            .into_response()),
        Readiness::Unavailable(_) => Err(HTTPError::unavailable()),
    }
}

async fn me(user: SessionUser) -> Json<SessionUser> {
    Json(user)
}

fn ensure_available(state: &AppState) -> Result<(), HTTPError> {
    match state.slot.get() {
        Readiness::Resolved(_) => Ok(()),
        Readiness::Loading | Readiness::Unavailable(_) => Err(HTTPError::unavailable()),
    }
}

/// Signs in with a provider ID token and returns once the session reflects
/// the new user.
async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SessionUser>, HTTPError> {
    ensure_available(&state)?;

    let provider_user = state.provider.sign_in_with_id_token(&request.id_token).await?;
    let user = SessionUser::try_from(provider_user)
        .map_err(|e| HTTPError::new(StatusCode::BAD_GATEWAY, e.to_string()))?;

    let limit = Duration::from_millis(state.config.guard.ready_timeout_ms);
    let mirrored = state
        .slot
        .wait_until(|r| r.session() == Some(&user), limit)
        .await;
    if !mirrored {
        warn!(
            "Session did not reflect sign-in of '{}' within {} ms",
            user.subject_id, state.config.guard.ready_timeout_ms
        );
    }

    info!("Signed in '{}'", user.subject_id);
    Ok(Json(user))
}

/// Signs out and returns once the session is empty.
async fn sign_out(State(state): State<AppState>) -> Result<StatusCode, HTTPError> {
    ensure_available(&state)?;
    state.provider.sign_out().await?;

    let limit = Duration::from_millis(state.config.guard.ready_timeout_ms);
    if !state
        .slot
        .wait_until(|r| matches!(r, Readiness::Resolved(None)), limit)
        .await
    {
        warn!(
            "Session not cleared within {} ms of sign-out",
            state.config.guard.ready_timeout_ms
        );
    }

    info!("Signed out");
    Ok(StatusCode::NO_CONTENT)
}
