//! The single-page application, served from disk behind the route guard.

use axum::middleware;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::guard::navigation_guard;
use crate::state::AppState;

/// Serves `site.root`. Page paths without a matching file get the index
/// document so client-side routing can take over.
pub fn routes(state: AppState) -> Router {
    let site = &state.config.site;
    let index = site.root.join(&site.index);
    let files = ServeDir::new(&site.root)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(index));

    Router::new()
        .fallback_service(files)
        .layer(middleware::from_fn_with_state(state, navigation_guard))
}
