mod common;

use axum::http::{header, Method, StatusCode};
use axum::Router;
use serde_json::json;
use sessiongate::session::Readiness;
use tower::ServiceExt;

use common::{body_json, build_app, json_request, request, site_dir, static_config};

async fn location_of(app: &Router, path: &str) -> Option<String> {
    let response = app
        .clone()
        .oneshot(request(Method::GET, path))
        .await
        .expect("request should complete");
    if response.status() == StatusCode::TEMPORARY_REDIRECT {
        response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string())
    } else {
        assert_eq!(response.status(), StatusCode::OK, "GET {}", path);
        None
    }
}

#[tokio::test]
async fn signed_out_navigation_redirects_to_login() {
    let (app, state, _mirror) = build_app(static_config(&site_dir(), None)).await;
    assert_eq!(state.slot.get(), Readiness::Resolved(None));

    assert_eq!(location_of(&app, "/dashboard").await.as_deref(), Some("/login"));
    assert_eq!(location_of(&app, "/").await.as_deref(), Some("/login"));
    assert_eq!(location_of(&app, "/login").await, None);
}

#[tokio::test]
async fn share_links_and_assets_need_no_session() {
    let (app, _state, _mirror) = build_app(static_config(&site_dir(), None)).await;

    assert_eq!(location_of(&app, "/share/abc123").await, None);
    assert_eq!(location_of(&app, "/assets/app.css").await, None);
    assert_eq!(location_of(&app, "/shared").await, None);
    assert_eq!(location_of(&app, "/share-links").await, None);
}

#[tokio::test]
async fn dotted_page_paths_are_guarded() {
    let (app, _state, _mirror) = build_app(static_config(&site_dir(), None)).await;

    for path in ["/profile/ana.smith", "/reports/2024.q1", "/index.html"] {
        assert_eq!(
            location_of(&app, path).await.as_deref(),
            Some("/login"),
            "GET {}",
            path
        );
    }
    assert_eq!(location_of(&app, "/assets/app.css").await, None);
}

#[tokio::test]
async fn dotted_page_paths_load_with_a_session() {
    let (app, _state, _mirror) = build_app(static_config(&site_dir(), Some("u1"))).await;

    assert_eq!(location_of(&app, "/profile/ana.smith").await, None);
    assert_eq!(location_of(&app, "/reports/2024.q1").await, None);
}

#[tokio::test]
async fn restored_session_is_sent_home_from_login() {
    let (app, _state, _mirror) = build_app(static_config(&site_dir(), Some("u1"))).await;

    assert_eq!(location_of(&app, "/login").await.as_deref(), Some("/"));
    assert_eq!(location_of(&app, "/dashboard").await, None);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/me"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "subject_id": "u1", "display_name": "Ana", "avatar_url": null })
    );
}

#[tokio::test]
async fn sign_in_then_sign_out_round_trip() {
    let (app, state, mirror) = build_app(static_config(&site_dir(), None)).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/session",
            json!({ "id_token": "ana-token" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["subject_id"], "u1");
    assert_eq!(state.slot.get().session().unwrap().subject_id, "u1");
    assert_eq!(location_of(&app, "/login").await.as_deref(), Some("/"));

    let response = app
        .clone()
        .oneshot(request(Method::DELETE, "/api/session"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.slot.get(), Readiness::Resolved(None));
    assert_eq!(location_of(&app, "/dashboard").await.as_deref(), Some("/login"));

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/session"))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await,
        json!({ "status": "resolved", "user": null })
    );

    mirror.expect("mirror should be running").shutdown().await;
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let (app, state, _mirror) = build_app(static_config(&site_dir(), None)).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/session",
            json!({ "id_token": "nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(state.slot.get(), Readiness::Resolved(None));
}

#[tokio::test]
async fn me_requires_a_session() {
    let (app, _state, _mirror) = build_app(static_config(&site_dir(), None)).await;

    let response = app.oneshot(request(Method::GET, "/api/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn failed_provider_init_is_surfaced() {
    // "ghost" is not a configured account, so the provider cannot initialize.
    let (app, state, mirror) = build_app(static_config(&site_dir(), Some("ghost"))).await;
    assert!(mirror.is_none());
    assert!(matches!(state.slot.get(), Readiness::Unavailable(_)));

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/session"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Authentication unavailable" })
    );

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/session",
            json!({ "id_token": "ana-token" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Protected pages fall back to the most restrictive decision.
    assert_eq!(location_of(&app, "/dashboard").await.as_deref(), Some("/login"));
    assert_eq!(location_of(&app, "/share/abc123").await, None);
}

#[tokio::test]
async fn health_is_ok_once_resolved() {
    let (app, _state, _mirror) = build_app(static_config(&site_dir(), None)).await;

    let response = app.oneshot(request(Method::GET, "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn account_without_uid_is_not_signed_in() {
    let (app, state, _mirror) = build_app(static_config(&site_dir(), None)).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/session",
            json!({ "id_token": "blank-token" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(state.slot.get(), Readiness::Resolved(None));
}
