use arena_navigation::{
    AppConfig, AppState, HttpPermissionSource, PermissionFetchError, PermissionSource, Session,
    arena_navigator, create_router,
    models::{ErrorResponse, HrefResponse},
    route::{ResolvedRoute, RouteManifestEntry},
};
use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::util::ServiceExt;

// --- Test Servers ---

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

async fn spawn_app() -> String {
    let state = AppState::new(AppConfig::default()).expect("arena table is valid");
    serve(create_router(state)).await
}

/// A stand-in for the backend API's permission endpoints.
async fn spawn_permission_api() -> String {
    let router = Router::new()
        .route(
            "/user/permissions",
            get(|| async { Json(json!(["admin", "users"])) }),
        )
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/garbage", get(|| async { "not json" }));
    serve(router).await
}

// --- Manifest Service ---

#[tokio::test]
async fn test_health_check() {
    let address = spawn_app().await;
    let response = reqwest::get(format!("{}/health", address))
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_routes_manifest() {
    let address = spawn_app().await;
    let manifest: Vec<RouteManifestEntry> = reqwest::get(format!("{}/routes", address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(manifest.len(), 17);
    assert!(
        manifest
            .iter()
            .any(|entry| entry.name.as_deref() == Some("admin") && entry.meta.requires_admin)
    );
}

#[tokio::test]
async fn test_resolve_endpoint() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let resolved: ResolvedRoute = client
        .get(format!("{}/resolve", address))
        .query(&[("path", "/t/5/bracket?round=2")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resolved.name.as_deref(), Some("tournamentBracket"));
    assert_eq!(resolved.params.get("tid").map(String::as_str), Some("5"));
    assert_eq!(resolved.query.get("round").map(String::as_str), Some("2"));

    let missing = client
        .get(format!("{}/resolve", address))
        .query(&[("path", "/nowhere")])
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    let body: ErrorResponse = missing.json().await.unwrap();
    assert!(body.error.contains("/nowhere"));
}

#[tokio::test]
async fn test_resolve_reports_props_per_layout() {
    let app = create_router(AppState::new(AppConfig::default()).unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/resolve?path=/t/42/teams")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    assert_eq!(body["name"], "tournamentTeams");
    assert_eq!(body["params"]["tid"], "42");
    assert_eq!(body["props"], false);
    assert_eq!(
        body["matched_views"],
        json!([
            { "view": "tournament/tournamentDetail", "props": true },
            { "view": "tournament/tournamentTeams", "props": false }
        ])
    );
}

#[tokio::test]
async fn test_href_endpoint() {
    let address = spawn_app().await;

    let built: HrefResponse = reqwest::get(format!("{}/href/packInfo?pack_id=9", address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(built.href, "/pack/9");

    let incomplete = reqwest::get(format!("{}/href/matchDetail?tid=1", address))
        .await
        .unwrap();
    assert_eq!(incomplete.status(), 422);

    let unknown = reqwest::get(format!("{}/href/ghost", address)).await.unwrap();
    assert_eq!(unknown.status(), 404);
}

// --- HTTP Permission Source ---

#[tokio::test]
async fn test_http_source_fetches_permission_array() {
    let api = spawn_permission_api().await;
    let source = HttpPermissionSource::new(&api, "/user/permissions");

    let permissions = source.fetch_permissions().await.unwrap();

    assert_eq!(permissions.len(), 2);
    assert!(permissions.contains("users"));
}

#[tokio::test]
async fn test_http_source_maps_failures() {
    let api = spawn_permission_api().await;

    let status = HttpPermissionSource::new(&api, "broken").fetch_permissions().await;
    assert_eq!(status, Err(PermissionFetchError::Status(500)));

    let payload = HttpPermissionSource::new(&api, "garbage").fetch_permissions().await;
    assert!(matches!(payload, Err(PermissionFetchError::Payload(_))));

    let unreachable = HttpPermissionSource::new("http://127.0.0.1:1", "x")
        .fetch_permissions()
        .await;
    assert!(matches!(unreachable, Err(PermissionFetchError::Transport(_))));
}

#[test]
fn test_http_source_url_joining() {
    let source = HttpPermissionSource::new("https://api.arena.example/", "/user/permissions");
    assert_eq!(source.url(), "https://api.arena.example/user/permissions");
}

#[tokio::test]
async fn test_arena_navigator_over_http() {
    let api = spawn_permission_api().await;
    let config = AppConfig {
        api_base_url: api,
        ..AppConfig::default()
    };
    let session = Arc::new(Session::logged_in());
    let navigator = arena_navigator(&config, session.clone()).unwrap();

    let users = navigator.push("/admin/users").await.unwrap();
    assert_eq!(users.route.name.as_deref(), Some("users"));

    let badges = navigator.push("/admin/badges").await.unwrap();
    assert_eq!(badges.route.name.as_deref(), Some("home"));
    assert!(session.permissions().is_loaded());
}
