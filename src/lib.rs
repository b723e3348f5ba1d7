use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Navigation core: table, matching, guards, views, history.
pub mod error;
pub mod guards;
pub mod history;
pub mod navigation;
pub mod pattern;
pub mod permissions;
pub mod progress;
pub mod route;
pub mod session;
pub mod views;

// The Arena route table.
pub mod routes;

// Manifest service.
pub mod api;
pub mod config;
pub mod handlers;
pub mod models;

// --- Public Re-exports ---

pub use config::{AppConfig, Env};
pub use error::{NavigationError, PermissionFetchError, RouteTableError, ViewLoadError};
pub use guards::{AfterHook, GuardDecision, NavigationContext, NavigationGuard, PermissionGate};
pub use navigation::{Navigation, Navigator};
pub use permissions::{
    AdminPermissionPolicy, HttpPermissionSource, MockPermissionSource, PermissionPolicy,
    PermissionSet, PermissionSource, PermissionSourceState,
};
pub use progress::{ProgressBar, ProgressIndicator, ProgressSettings, ProgressState};
pub use route::{MatchedView, NavigationTarget, ResolvedRoute, Route, RouteMeta, RouteTable};
pub use session::{PermissionCache, Session, SessionState};
pub use views::{ModuleViewFactory, ViewRegistry};

use guards::{ProgressDone, ProgressStart};

/// ApiDoc
///
/// OpenAPI document of the manifest service, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_routes, handlers::resolve_path, handlers::get_href),
    components(
        schemas(
            route::RouteManifestEntry, route::ResolvedRoute, route::MatchedView, route::RouteMeta,
            models::HrefResponse, models::ErrorResponse,
        )
    ),
    tags(
        (name = "arena-navigation", description = "Arena client route manifest")
    )
)]
struct ApiDoc;

/// RouteTableState
///
/// The validated table, shared by every request.
pub type RouteTableState = Arc<RouteTable>;

/// AppState
///
/// State of the manifest service.
#[derive(Clone)]
pub struct AppState {
    pub table: RouteTableState,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state around the Arena route table.
    pub fn new(config: AppConfig) -> Result<Self, RouteTableError> {
        let table = Arc::new(RouteTable::new(routes::arena_routes())?);
        Ok(Self { table, config })
    }
}

impl FromRef<AppState> for RouteTableState {
    fn from_ref(app_state: &AppState) -> RouteTableState {
        app_state.table.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

// --- Navigator Assembly ---

/// build_navigator
///
/// Wires the Arena navigator: the route table, views resolved on demand under
/// `views/`, the permission gate first and the progress bar second, and the
/// progress finish hook.
pub fn build_navigator(
    config: &AppConfig,
    session: SessionState,
    source: PermissionSourceState,
    progress: ProgressState,
) -> Result<Navigator, RouteTableError> {
    let table = Arc::new(RouteTable::new(routes::arena_routes())?);
    let views = Arc::new(ViewRegistry::for_table(
        &table,
        Arc::new(ModuleViewFactory::default()),
    ));

    let mut navigator = Navigator::new(table, views).with_max_redirects(config.max_redirects);
    navigator.before_each(PermissionGate::new(session, source));
    navigator.before_each(ProgressStart::new(Arc::clone(&progress)));
    let ready = navigator.ready_signal();
    navigator.after_each(ProgressDone::new(progress, ready));
    Ok(navigator)
}

/// arena_navigator
///
/// `build_navigator` with the HTTP permission source and a progress bar
/// configured from `config`.
pub fn arena_navigator(config: &AppConfig, session: SessionState) -> Result<Navigator, RouteTableError> {
    let source = Arc::new(HttpPermissionSource::from_config(config)) as PermissionSourceState;
    let progress = Arc::new(ProgressBar::new(ProgressSettings {
        show_spinner: config.progress_show_spinner,
        ..ProgressSettings::default()
    })) as ProgressState;
    build_navigator(config, session, source, progress)
}

// --- Manifest Service ---

/// create_router
///
/// Assembles the manifest service: Swagger UI, the manifest routes, request
/// correlation and tracing, and CORS for the browser client.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api::manifest_routes())
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Generates a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Returns the x-request-id header to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with its request id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
