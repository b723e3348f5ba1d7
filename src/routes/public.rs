use crate::route::Route;

/// Public Route Module
///
/// Pages with no access flags. The gate lets these through without touching the
/// permission cache.
pub fn public_routes() -> Vec<Route> {
    vec![
        // The landing page, also the redirect target of every denied admin navigation.
        Route::new("/", "home").named(super::HOME),
        Route::new("/post/:post_id", "post").named("post").with_props(),
        // --- Packs ---
        Route::new("/pack", "pack/pack").named("pack"),
        Route::new("/pack/:pack_id", "pack/packInfo").named("packInfo"),
        Route::new("/newPack", "pack/newPack").named("newPack"),
        // --- Users ---
        // `/user/edit` outranks `/user/:user_id` because static segments win.
        Route::new("/user/:user_id", "user").named("user"),
        Route::new("/user/edit", "userEdit").named("userEdit"),
        // --- Forum ---
        Route::new("/forum", "forum").named("forum"),
        // The id is absent when composing a new post.
        Route::new("/forum/editor/:id?", "editor").named("editor").with_props(),
        // OAuth provider callback.
        Route::new("/oauth/complete", "auth/oAuthComplete").named("oAuthComplete"),
        Route::new("/about", "about").named("about"),
        Route::new("/event/:event_id", "event").named("event").with_props(),
    ]
}
