//! Route Table Index
//!
//! The Arena navigation table, split by audience: open pages, tournament pages
//! (some carrying staff metadata), and the admin area behind the permission gate.

use crate::route::Route;

/// Pages reachable by anyone.
pub mod public;

/// Tournament listing, detail tabs, match and referee pages.
pub mod tournament;

/// The admin area. Every child inherits `requires_admin`.
pub mod admin;

/// Name of the route the permission gate falls back to.
pub const HOME: &str = "home";

/// arena_routes
///
/// Assembles the full declared table in registration order.
pub fn arena_routes() -> Vec<Route> {
    let mut routes = public::public_routes();
    routes.extend(tournament::tournament_routes());
    routes.push(admin::admin_routes());
    routes
}
