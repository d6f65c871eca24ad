use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::identity::ProviderError;
use crate::models::SessionUser;
use crate::session::Readiness;
use crate::state::AppState;

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
        }
    }

    pub fn unavailable() -> Self {
        HTTPError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Authentication unavailable",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Converts our `HTTPError` into a JSON error response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ProviderError> for HTTPError {
    fn from(err: ProviderError) -> Self {
        let status = match &err {
            ProviderError::Rejected(_) => StatusCode::UNAUTHORIZED,
            ProviderError::Transport(_) => StatusCode::BAD_GATEWAY,
            ProviderError::Config(_) | ProviderError::Persistence(_) | ProviderError::Decode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        HTTPError::new(status, err.to_string())
    }
}

/// Extractor implementation: yields the signed-in `SessionUser`, or rejects
/// with 401 when nobody is signed in and 503 when the session is not known.
#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = HTTPError;

    async fn from_request_parts(
        _parts: &mut http::request::Parts,
        state: &AppState,
    ) -> Result<SessionUser, HTTPError> {
        match state.slot.get() {
            Readiness::Resolved(Some(user)) => Ok(user),
            Readiness::Resolved(None) => {
                Err(HTTPError::new(StatusCode::UNAUTHORIZED, "Not signed in"))
            }
            Readiness::Loading | Readiness::Unavailable(_) => Err(HTTPError::unavailable()),
        }
    }
}
