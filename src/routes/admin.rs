use crate::route::Route;

/// Admin Route Module
///
/// The whole subtree is flagged `requires_admin` on the parent. Each child is
/// checked against the permission set under its own name, so access can be
/// granted per page (`users`, `badges`, ...).
pub fn admin_routes() -> Route {
    Route::new("/admin", "admin/admin")
        .named("admin")
        .requires_admin()
        .children(vec![
            Route::new("dashboard", "admin/dashboard").named("dashboard"),
            Route::new("users", "admin/users").named("users"),
            Route::new("announcement", "admin/announcement").named("announcement"),
            Route::new("posts", "admin/posts").named("posts"),
            Route::new("postFiles", "admin/postFiles").named("postFiles"),
            Route::new("homeImgs", "admin/homeImgs").named("homeImgs"),
            // --- Events ---
            Route::new("events", "admin/events").named("events"),
            Route::new("events/:event_id/stage", "admin/eventStages")
                .named("eventStages")
                .with_props(),
            Route::new("badges", "admin/badges").named("badges"),
            // --- Tournaments ---
            Route::new("tournament", "admin/tournament/adminTournamentList").named("adminTournamentList"),
            Route::new("tournament/:tid", "admin/tournament/adminTournamentDetail")
                .named("adminTournamentDetail")
                .with_props(),
        ])
}
