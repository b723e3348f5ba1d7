use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Manifest Router Module
///
/// Read-only endpoints exposing the navigation table to the rest of the
/// application. Nothing here runs guards or touches a session.
pub fn manifest_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // GET /routes
        // The declared route tree.
        .route("/routes", get(handlers::get_routes))
        // GET /resolve?path=...
        // Which route, params and view a location lands on.
        .route("/resolve", get(handlers::resolve_path))
        // GET /href/{name}?param=value
        // Link building for named routes.
        .route("/href/{name}", get(handlers::get_href))
}
