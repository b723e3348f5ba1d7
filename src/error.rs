use thiserror::Error;

/// RouteTableError
///
/// Raised while building a route table. A table that fails validation is never
/// installed, so every error here is a programming error in the route definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("Duplicate route name: {0}")]
    DuplicateName(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// PermissionFetchError
///
/// Every way the permission fetch can fail. The admin gate swallows all of them
/// and redirects; they only ever reach the logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionFetchError {
    #[error("Permission request failed: {0}")]
    Transport(String),

    #[error("Permission endpoint answered with status {0}")]
    Status(u16),

    #[error("Malformed permission payload: {0}")]
    Payload(String),

    #[error("Permission fetch task aborted")]
    Aborted,
}

/// ViewLoadError
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewLoadError {
    #[error("No view registered under '{0}'")]
    Unregistered(String),

    #[error("View '{view}' failed to load: {reason}")]
    Failed { view: String, reason: String },
}

/// NavigationError
///
/// Reasons a navigation does not end on a mounted view. Guard redirects are not
/// errors: they are followed until a navigation settles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("No route matches '{0}'")]
    NoMatch(String),

    #[error("No route named '{0}'")]
    UnknownRoute(String),

    #[error("Route '{route}' requires param '{param}'")]
    MissingParam { route: String, param: String },

    #[error("Navigation to '{0}' was superseded by a newer navigation")]
    Superseded(String),

    #[error("Gave up after {0} redirects")]
    TooManyRedirects(usize),

    #[error("No history entry to move to")]
    HistoryExhausted,

    #[error(transparent)]
    View(#[from] ViewLoadError),
}
