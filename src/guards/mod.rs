//! Navigation Middleware
//!
//! Guards run before a navigation settles, in registration order, and may
//! redirect it. After-hooks run once the outcome is known, whatever it is.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::NavigationError,
    route::{NavigationTarget, ResolvedRoute},
    navigation::Navigation,
};

/// Admin permission gate.
pub mod admin;

/// Progress bar start/finish hooks.
pub mod progress;

pub use admin::PermissionGate;
pub use progress::{ProgressDone, ProgressStart};

/// NavigationContext
///
/// What a guard is told about the navigation it is deciding on.
#[derive(Debug, Clone)]
pub struct NavigationContext {
    /// Correlates every log line of one navigation, redirects included.
    pub id: Uuid,
    pub target: ResolvedRoute,
    /// The route being left; `None` on the initial navigation.
    pub source: Option<ResolvedRoute>,
}

/// GuardDecision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    /// Abandon the target and navigate here instead. Guards run again for it.
    Redirect(NavigationTarget),
}

/// NavigationGuard
///
/// A pre-navigation check. The first guard that redirects short-circuits the rest.
#[async_trait]
pub trait NavigationGuard: Send + Sync {
    async fn before_each(&self, context: &NavigationContext) -> GuardDecision;
}

/// NavigationReport
///
/// Handed to after-hooks once a navigation has settled.
#[derive(Debug, Clone)]
pub struct NavigationReport {
    pub id: Uuid,
    pub source: Option<ResolvedRoute>,
    pub outcome: Result<Navigation, NavigationError>,
}

/// AfterHook
#[async_trait]
pub trait AfterHook: Send + Sync {
    async fn after_each(&self, report: &NavigationReport);
}
