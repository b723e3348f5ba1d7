use crate::{
    AppState,
    error::NavigationError,
    models::{ErrorResponse, HrefResponse, ResolveQuery},
    pattern::Params,
    route::{ResolvedRoute, RouteManifestEntry},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps a table lookup failure to the status the service answers with.
fn api_error(error: NavigationError) -> ApiError {
    let status = match error {
        NavigationError::NoMatch(_) | NavigationError::UnknownRoute(_) => StatusCode::NOT_FOUND,
        NavigationError::MissingParam { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// --- Handlers ---

/// get_routes
///
/// Returns the declared route tree with full patterns and access flags, for
/// link generation and hiding admin UI.
#[utoipa::path(
    get,
    path = "/routes",
    responses((status = 200, description = "Route manifest", body = [RouteManifestEntry]))
)]
pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteManifestEntry>> {
    Json(state.table.manifest())
}

/// resolve_path
///
/// Resolves a location the way the client navigator would, without running guards.
#[utoipa::path(
    get,
    path = "/resolve",
    params(ResolveQuery),
    responses(
        (status = 200, description = "Matched route", body = ResolvedRoute),
        (status = 404, description = "No route matches", body = ErrorResponse)
    )
)]
pub async fn resolve_path(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ResolvedRoute>, ApiError> {
    state.table.resolve(&query.path).map(Json).map_err(api_error)
}

/// get_href
///
/// Builds the link of a named route. Every query parameter is offered as a path
/// param; the ones the pattern does not declare are ignored.
#[utoipa::path(
    get,
    path = "/href/{name}",
    params(("name" = String, Path, description = "Route name")),
    responses(
        (status = 200, description = "Built link", body = HrefResponse),
        (status = 404, description = "Unknown route", body = ErrorResponse),
        (status = 422, description = "Missing param", body = ErrorResponse)
    )
)]
pub async fn get_href(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<HrefResponse>, ApiError> {
    let href = state.table.href(&name, &params).map_err(api_error)?;
    Ok(Json(HrefResponse { href }))
}
