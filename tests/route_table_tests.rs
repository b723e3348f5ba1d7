use arena_navigation::{
    ModuleViewFactory, NavigationError, NavigationTarget, ResolvedRoute, Route, RouteTable,
    RouteTableError, ViewRegistry,
    pattern::Params,
    routes::arena_routes,
};
use std::sync::Arc;

fn table() -> RouteTable {
    RouteTable::new(arena_routes()).expect("arena table is valid")
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn views(route: &ResolvedRoute) -> Vec<&str> {
    route.matched_views.iter().map(|matched| matched.view.as_str()).collect()
}

// --- Arena Table ---

#[test]
fn test_every_named_route_is_unique() {
    let table = table();
    let mut names: Vec<&str> = table.names().collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total);
    assert_eq!(total, 33);
    assert!(table.contains("home"));
    assert!(table.contains("adminTournamentDetail"));
}

#[test]
fn test_static_route_wins_over_param_route() {
    let table = table();
    assert_eq!(table.resolve("/user/edit").unwrap().name.as_deref(), Some("userEdit"));

    let user = table.resolve("/user/12").unwrap();
    assert_eq!(user.name.as_deref(), Some("user"));
    assert_eq!(user.params, params(&[("user_id", "12")]));
}

#[test]
fn test_encoded_params_round_trip_through_href() {
    let table = table();
    let user = table.resolve("/user/%E5%BC%A0").unwrap();
    assert_eq!(user.params, params(&[("user_id", "张")]));
    assert_eq!(user.path, "/user/%E5%BC%A0");

    assert_eq!(
        table.href("user", &params(&[("user_id", "张")])),
        Ok("/user/%E5%BC%A0".to_string())
    );
}

#[test]
fn test_empty_child_resolves_parent_path() {
    let overview = table().resolve("/t/42").unwrap();
    assert_eq!(overview.name.as_deref(), Some("tournamentOverview"));
    assert_eq!(overview.params, params(&[("tid", "42")]));
    assert_eq!(
        views(&overview),
        vec!["tournament/tournamentDetail", "tournament/tournamentOverview"]
    );
    let flags: Vec<bool> = overview.matched_views.iter().map(|matched| matched.props).collect();
    assert_eq!(flags, vec![true, false]);
    assert!(!overview.props);
}

#[test]
fn test_tournament_tabs_and_match_pages() {
    let table = table();
    assert_eq!(
        table.resolve("/t/42/teams").unwrap().name.as_deref(),
        Some("tournamentTeams")
    );

    let detail = table.resolve("/t/42/match/7").unwrap();
    assert_eq!(detail.name.as_deref(), Some("matchDetail"));
    assert_eq!(detail.params, params(&[("tid", "42"), ("matchId", "7")]));
    assert!(detail.props);

    let referee = table.resolve("/t/42/referee/7").unwrap();
    assert!(referee.meta.requires_staff);
    assert!(!referee.meta.requires_admin);
}

#[test]
fn test_admin_children_inherit_requires_admin() {
    let table = table();

    let admin = table.resolve("/admin").unwrap();
    assert_eq!(admin.name.as_deref(), Some("admin"));
    assert!(admin.meta.requires_admin);

    let stage = table.resolve("/admin/events/5/stage").unwrap();
    assert_eq!(stage.name.as_deref(), Some("eventStages"));
    assert!(stage.meta.requires_admin);
    assert_eq!(stage.params, params(&[("event_id", "5")]));
    assert_eq!(views(&stage), vec!["admin/admin", "admin/eventStages"]);

    assert!(!table.resolve("/forum").unwrap().meta.requires_admin);
}

#[test]
fn test_optional_editor_id() {
    let table = table();
    let new_post = table.resolve("/forum/editor").unwrap();
    assert_eq!(new_post.name.as_deref(), Some("editor"));
    assert!(new_post.params.is_empty());

    let existing = table.resolve("/forum/editor/31").unwrap();
    assert_eq!(existing.params, params(&[("id", "31")]));
}

#[test]
fn test_query_and_hash_are_split_off() {
    let forum = table().resolve("/forum?sort=new&page=2#top").unwrap();
    assert_eq!(forum.path, "/forum");
    assert_eq!(forum.query.get("page").map(String::as_str), Some("2"));
    assert_eq!(forum.query.get("sort").map(String::as_str), Some("new"));
    assert_eq!(forum.hash.as_deref(), Some("top"));
    assert_eq!(forum.full_path, "/forum?page=2&sort=new#top");
}

#[test]
fn test_unknown_path_has_no_match() {
    assert_eq!(
        table().resolve("/nowhere"),
        Err(NavigationError::NoMatch("/nowhere".to_string()))
    );
}

// --- Named Resolution ---

#[test]
fn test_href_builds_links() {
    let table = table();
    assert_eq!(table.href("packInfo", &params(&[("pack_id", "3")])), Ok("/pack/3".to_string()));
    assert_eq!(table.href("editor", &Params::new()), Ok("/forum/editor".to_string()));
    assert_eq!(
        table.href("adminTournamentDetail", &params(&[("tid", "8")])),
        Ok("/admin/tournament/8".to_string())
    );
    assert_eq!(table.href("home", &Params::new()), Ok("/".to_string()));
}

#[test]
fn test_href_reports_missing_param_and_unknown_name() {
    let table = table();
    assert_eq!(
        table.href("matchDetail", &params(&[("tid", "1")])),
        Err(NavigationError::MissingParam {
            route: "matchDetail".to_string(),
            param: "matchId".to_string(),
        })
    );
    assert_eq!(
        table.href("ghost", &Params::new()),
        Err(NavigationError::UnknownRoute("ghost".to_string()))
    );
}

#[test]
fn test_resolve_named_target_keeps_declared_params_only() {
    let target = NavigationTarget::named_with("post", &[("post_id", "5"), ("stray", "x")]);
    let post = table().resolve_target(&target).unwrap();
    assert_eq!(post.path, "/post/5");
    assert_eq!(post.params, params(&[("post_id", "5")]));
}

// --- Validation ---

#[test]
fn test_duplicate_names_are_rejected() {
    let result = RouteTable::new(vec![
        Route::new("/a", "a").named("dup"),
        Route::new("/b", "b").children(vec![Route::new("c", "c").named("dup")]),
    ]);
    assert_eq!(result.err(), Some(RouteTableError::DuplicateName("dup".to_string())));
}

#[test]
fn test_absolute_child_pattern_is_rejected() {
    let result = RouteTable::new(vec![
        Route::new("/a", "a").children(vec![Route::new("/b", "b")]),
    ]);
    assert!(matches!(result, Err(RouteTableError::InvalidPattern { .. })));
}

// --- Manifest & Views ---

#[test]
fn test_manifest_mirrors_declared_tree() {
    let manifest = table().manifest();
    assert_eq!(manifest.len(), 17);

    let admin = manifest
        .iter()
        .find(|entry| entry.name.as_deref() == Some("admin"))
        .unwrap();
    assert_eq!(admin.children.len(), 11);
    assert!(admin.meta.requires_admin);
    let users = admin
        .children
        .iter()
        .find(|entry| entry.name.as_deref() == Some("users"))
        .unwrap();
    assert_eq!(users.pattern, "users");
    assert_eq!(users.full_pattern, "/admin/users");

    let detail = manifest
        .iter()
        .find(|entry| entry.full_pattern == "/t/:tid")
        .unwrap();
    assert_eq!(detail.name, None);
    assert_eq!(detail.children[0].full_pattern, "/t/:tid");
}

#[test]
fn test_view_registry_covers_every_view() {
    let table = table();
    let registry = ViewRegistry::for_table(&table, Arc::new(ModuleViewFactory::default()));
    for view in ["home", "tournament/tournamentDetail", "admin/admin", "admin/tournament/adminTournamentList"] {
        assert!(registry.is_registered(view), "{} should be registered", view);
    }
}
