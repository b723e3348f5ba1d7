use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Manifest Service Schemas ---

/// ResolveQuery
///
/// Query parameters of `GET /resolve`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ResolveQuery {
    /// Location to resolve, e.g. `/t/42/teams?tab=1`.
    pub path: String,
}

/// HrefResponse
///
/// A link built from a named route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HrefResponse {
    pub href: String,
}

/// ErrorResponse
///
/// Body returned alongside every non-2xx status of the manifest service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}
