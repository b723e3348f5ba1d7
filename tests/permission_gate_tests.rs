use arena_navigation::{
    AppConfig, MockPermissionSource, NavigationError, Navigator, PermissionCache, PermissionSet,
    PermissionSourceState, ProgressBar, Session, SessionState, build_navigator,
};
use std::sync::Arc;
use std::time::Duration;

// --- Test Harness ---

struct Harness {
    navigator: Navigator,
    session: SessionState,
    source: Arc<MockPermissionSource>,
}

fn harness(session: Session, source: MockPermissionSource) -> Harness {
    let session = Arc::new(session);
    let source = Arc::new(source);
    let navigator = build_navigator(
        &AppConfig::default(),
        session.clone(),
        source.clone(),
        Arc::new(ProgressBar::default()),
    )
    .expect("arena table is valid");
    Harness {
        navigator,
        session,
        source,
    }
}

fn landed_on(result: &Result<arena_navigation::Navigation, NavigationError>) -> Option<&str> {
    result
        .as_ref()
        .ok()
        .and_then(|navigation| navigation.route.name.as_deref())
}

// --- Gate Behaviour ---

#[tokio::test]
async fn test_public_route_never_fetches() {
    let h = harness(Session::logged_in(), MockPermissionSource::new(["admin"]));

    let result = h.navigator.push("/forum").await;

    assert_eq!(landed_on(&result), Some("forum"));
    assert_eq!(h.source.calls(), 0);
    assert!(!h.session.permissions().is_loaded());
}

#[tokio::test]
async fn test_anonymous_session_is_judged_on_cache_without_fetch() {
    let h = harness(Session::anonymous(), MockPermissionSource::new(["*"]));

    let result = h.navigator.push("/admin").await;

    assert_eq!(landed_on(&result), Some("home"));
    assert_eq!(result.unwrap().redirected_from.as_deref(), Some("/admin"));
    assert_eq!(h.source.calls(), 0);
}

#[tokio::test]
async fn test_anonymous_session_with_committed_permissions_proceeds() {
    let h = harness(Session::anonymous(), MockPermissionSource::new(Vec::<String>::new()));
    h.session
        .permissions()
        .commit(["admin"].into_iter().collect());

    let result = h.navigator.push("/admin").await;

    assert_eq!(landed_on(&result), Some("admin"));
    assert_eq!(h.source.calls(), 0);
}

#[tokio::test]
async fn test_granted_admin_route_fetches_once_and_mounts_view() {
    let h = harness(Session::logged_in(), MockPermissionSource::new(["admin"]));

    let navigation = h.navigator.push("/admin").await.unwrap();

    assert_eq!(navigation.route.name.as_deref(), Some("admin"));
    assert_eq!(navigation.view.leaf().unwrap().view, "admin/admin");
    assert_eq!(h.source.calls(), 1);
    let cached = h.session.permissions().snapshot().unwrap();
    assert!(cached.contains("admin"));
}

#[tokio::test]
async fn test_denied_admin_route_redirects_home() {
    let h = harness(Session::logged_in(), MockPermissionSource::new(["users"]));

    let result = h.navigator.push("/admin").await;

    assert_eq!(landed_on(&result), Some("home"));
    assert_eq!(h.source.calls(), 1);
}

#[tokio::test]
async fn test_loaded_cache_is_not_fetched_again() {
    let h = harness(Session::logged_in(), MockPermissionSource::new(["admin"]));

    assert_eq!(landed_on(&h.navigator.push("/admin").await), Some("admin"));
    // `users` is not granted, but the decision comes from the cache.
    assert_eq!(landed_on(&h.navigator.push("/admin/users").await), Some("home"));
    assert_eq!(landed_on(&h.navigator.push("/admin").await), Some("admin"));

    assert_eq!(h.source.calls(), 1);
}

#[tokio::test]
async fn test_loaded_empty_set_is_distinct_from_unloaded() {
    let h = harness(Session::logged_in(), MockPermissionSource::new(Vec::<String>::new()));

    assert_eq!(landed_on(&h.navigator.push("/admin").await), Some("home"));
    assert_eq!(landed_on(&h.navigator.push("/admin/users").await), Some("home"));

    assert!(h.session.permissions().is_loaded());
    assert_eq!(h.source.calls(), 1);
}

#[tokio::test]
async fn test_fetch_failure_redirects_home_without_error() {
    let h = harness(Session::logged_in(), MockPermissionSource::new_failing());

    let result = h.navigator.push("/admin/users").await;

    assert_eq!(landed_on(&result), Some("home"));
    assert_eq!(h.source.calls(), 1);
    assert!(!h.session.permissions().is_loaded());

    // A later navigation tries again; the failure was not cached.
    let again = h.navigator.push("/admin/badges").await;
    assert_eq!(landed_on(&again), Some("home"));
    assert_eq!(h.source.calls(), 2);
}

#[tokio::test]
async fn test_wildcard_grants_every_admin_page() {
    let h = harness(Session::logged_in(), MockPermissionSource::new(["*"]));

    for path in ["/admin/badges", "/admin/tournament/3", "/admin/events/2/stage"] {
        let result = h.navigator.push(path).await;
        assert!(result.as_ref().unwrap().route.meta.requires_admin, "{}", path);
    }
    assert_eq!(h.source.calls(), 1);
}

#[tokio::test]
async fn test_log_out_invalidates_cached_permissions() {
    let h = harness(Session::logged_in(), MockPermissionSource::new(["*"]));
    assert_eq!(landed_on(&h.navigator.push("/admin").await), Some("admin"));

    h.session.log_out();
    assert!(!h.session.permissions().is_loaded());
    assert_eq!(landed_on(&h.navigator.push("/admin/users").await), Some("home"));
    assert_eq!(h.source.calls(), 1);

    h.session.log_in();
    assert_eq!(landed_on(&h.navigator.push("/admin/users").await), Some("users"));
    assert_eq!(h.source.calls(), 2);
}

// --- Concurrency ---

#[tokio::test]
async fn test_concurrent_admin_navigations_share_one_fetch() {
    let session: SessionState = Arc::new(Session::logged_in());
    let source = Arc::new(MockPermissionSource::new(["*"]).with_delay(Duration::from_millis(50)));
    let build = || {
        build_navigator(
            &AppConfig::default(),
            session.clone(),
            source.clone(),
            Arc::new(ProgressBar::default()),
        )
        .unwrap()
    };
    // Two tabs of the same session.
    let (first, second) = (build(), build());

    let (admin, users) = tokio::join!(first.push("/admin"), second.push("/admin/users"));

    assert_eq!(landed_on(&admin), Some("admin"));
    assert_eq!(landed_on(&users), Some("users"));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_superseded_navigation_still_shares_and_commits_fetch() {
    let h = harness(
        Session::logged_in(),
        MockPermissionSource::new(["*"]).with_delay(Duration::from_millis(50)),
    );

    let (admin, users) = tokio::join!(h.navigator.push("/admin"), h.navigator.push("/admin/users"));

    assert_eq!(admin.unwrap_err(), NavigationError::Superseded("/admin".to_string()));
    assert_eq!(landed_on(&users), Some("users"));
    assert_eq!(h.source.calls(), 1);
    assert!(h.session.permissions().is_loaded());
}

// --- Cache Slot ---

#[tokio::test]
async fn test_invalidation_discards_in_flight_result() {
    let cache = Arc::new(PermissionCache::new());
    let source: PermissionSourceState =
        Arc::new(MockPermissionSource::new(["admin"]).with_delay(Duration::from_millis(50)));

    let waiter = {
        let cache = cache.clone();
        let source = source.clone();
        tokio::spawn(async move { cache.load(&source).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(cache.is_pending());

    cache.invalidate();
    let outcome = waiter.await.unwrap();

    // The waiter still gets its answer, but the cache stays unloaded.
    assert!(outcome.unwrap().contains("admin"));
    assert!(!cache.is_loaded());
}

#[tokio::test]
async fn test_commit_wins_over_in_flight_fetch() {
    let cache = Arc::new(PermissionCache::new());
    let source: PermissionSourceState =
        Arc::new(MockPermissionSource::new(["admin"]).with_delay(Duration::from_millis(30)));

    let waiter = {
        let cache = cache.clone();
        let source = source.clone();
        tokio::spawn(async move { cache.load(&source).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;

    let committed: PermissionSet = ["badges"].into_iter().collect();
    cache.commit(committed.clone());
    waiter.await.unwrap().unwrap();

    assert_eq!(cache.snapshot(), Some(committed));
}
