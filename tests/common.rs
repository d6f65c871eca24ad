#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use sessiongate::config::{extract_config, ConfigV1};
use sessiongate::routes::create_router;
use sessiongate::session::SessionMirror;
use sessiongate::startup::bootstrap;
use sessiongate::state::AppState;

/// Writes a tiny built site into a fresh temp directory.
pub fn site_dir() -> PathBuf {
    let root = std::env::temp_dir().join(format!("sessiongate-site-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(root.join("assets")).expect("create site dir");
    std::fs::write(root.join("index.html"), "<html>app shell</html>").expect("write index");
    std::fs::write(root.join("assets/app.css"), "body{}").expect("write css");
    root
}

pub fn static_config(site_root: &PathBuf, signed_in: Option<&str>) -> ConfigV1 {
    let signed_in = signed_in
        .map(|uid| format!("  signed_in: {}\n", uid))
        .unwrap_or_default();
    let yaml = format!(
        r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
provider:
  type: static
  name: "Test accounts"
  users:
    - token: ana-token
      uid: u1
      display_name: Ana
    - token: blank-token
      uid: ""
{signed_in}guard:
  ready_timeout_ms: 2000
site:
  root: {root}
logging:
  level: debug
  format: console
"#,
        signed_in = signed_in,
        root = site_root.display()
    );

    extract_config(&Figment::new().merge(Yaml::string(&yaml))).expect("test config should parse")
}

pub async fn build_app(config: ConfigV1) -> (Router, AppState, Option<SessionMirror>) {
    let (state, mirror) = bootstrap(Arc::new(config)).await;
    (create_router(state.clone()), state, mirror)
}

pub fn request(method: Method, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn json_request(method: Method, path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
