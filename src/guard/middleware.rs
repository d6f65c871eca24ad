//! Navigation guard middleware for the page router.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use http::Method;
use tracing::{debug, warn};

use super::route_guard::Decision;
use crate::config::SiteConfig;
use crate::state::AppState;

/// Maps a request path onto `root`. `None` for paths that try to leave it.
pub fn site_file(root: &Path, path: &str) -> Option<PathBuf> {
    let mut file = root.to_path_buf();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." || segment.contains('\\') {
            return None;
        }
        file.push(segment);
    }
    Some(file)
}

/// True for requests served straight from the site: anything under an
/// asset prefix, and real files under `site.root` other than the index
/// document. A dot in the path makes nothing an asset by itself.
pub async fn is_asset(site: &SiteConfig, path: &str) -> bool {
    if site
        .asset_prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
    {
        return true;
    }
    let Some(file) = site_file(&site.root, path) else {
        return false;
    };
    if file == site.root.join(&site.index) {
        return false;
    }
    tokio::fs::metadata(&file)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Page navigations are GET/HEAD requests for anything that is not an asset.
pub async fn is_navigation(site: &SiteConfig, method: &Method, path: &str) -> bool {
    if method != Method::GET && method != Method::HEAD {
        return false;
    }
    !is_asset(site, path).await
}

/// Runs the route guard before a page is served.
///
/// While the session is still loading the request waits, up to
/// `guard.ready_timeout_ms`, for the first provider event.
pub async fn navigation_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_navigation(&state.config.site, request.method(), &path).await {
        return next.run(request).await;
    }

    let limit = Duration::from_millis(state.config.guard.ready_timeout_ms);
    let readiness = state.slot.wait_ready(limit).await;
    if readiness.is_loading() {
        warn!(
            "Session still loading after {} ms; guarding '{}' as signed out",
            state.config.guard.ready_timeout_ms, path
        );
    }

    match state.guard.decide_with(&path, &readiness) {
        Decision::Allow => next.run(request).await,
        Decision::RedirectTo(target) => {
            debug!("Redirecting navigation '{}' to '{}'", path, target);
            Redirect::temporary(&target).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(asset_prefixes: &[&str]) -> SiteConfig {
        let root =
            std::env::temp_dir().join(format!("sessiongate-guard-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("assets")).unwrap();
        std::fs::write(root.join("index.html"), "<html></html>").unwrap();
        std::fs::write(root.join("assets/app.css"), "body{}").unwrap();
        std::fs::write(root.join("favicon.ico"), "icon").unwrap();
        SiteConfig {
            root,
            index: "index.html".to_string(),
            asset_prefixes: asset_prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_site_file_refuses_traversal() {
        let root = Path::new("/srv/site");
        assert_eq!(
            site_file(root, "/assets/app.css"),
            Some(PathBuf::from("/srv/site/assets/app.css"))
        );
        assert_eq!(site_file(root, "/"), Some(PathBuf::from("/srv/site")));
        assert_eq!(site_file(root, "/assets/../../etc/passwd"), None);
        assert_eq!(site_file(root, "/./index.html"), None);
    }

    #[tokio::test]
    async fn test_existing_files_are_assets() {
        let site = site(&[]);
        assert!(!is_navigation(&site, &Method::GET, "/assets/app.css").await);
        assert!(!is_navigation(&site, &Method::HEAD, "/favicon.ico").await);
    }

    #[tokio::test]
    async fn test_dotted_page_paths_are_navigations() {
        let site = site(&[]);
        for path in ["/profile/ana.smith", "/reports/2024.q1", "/assets/missing.js"] {
            assert!(is_navigation(&site, &Method::GET, path).await, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_directories_and_index_are_navigations() {
        let site = site(&[]);
        for path in ["/", "/assets", "/index.html", "/dashboard", "/share/abc123"] {
            assert!(is_navigation(&site, &Method::GET, path).await, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_asset_prefix_skips_the_guard() {
        let site = site(&["/static/"]);
        assert!(!is_navigation(&site, &Method::GET, "/static/chunk.1234.js").await);
        assert!(is_navigation(&site, &Method::GET, "/staticky").await);
    }

    #[tokio::test]
    async fn test_only_get_and_head_are_navigations() {
        let site = site(&[]);
        assert!(!is_navigation(&site, &Method::POST, "/dashboard").await);
        assert!(is_navigation(&site, &Method::HEAD, "/dashboard").await);
    }
}
