use crate::route::Route;

/// Tournament Route Module
///
/// The detail page `/t/:tid` is an unnamed layout whose tabs are its children;
/// the empty-path child makes `/t/:tid` itself resolve to the overview tab.
pub fn tournament_routes() -> Vec<Route> {
    vec![
        Route::new("/t", "tournament/tournamentList").named("tournaments"),
        Route::new("/t/:tid", "tournament/tournamentDetail")
            .with_props()
            .children(vec![
                Route::new("", "tournament/tournamentOverview").named("tournamentOverview"),
                Route::new("teams", "tournament/tournamentTeams").named("tournamentTeams"),
                Route::new("register", "tournament/tournamentRegister").named("tournamentRegister"),
                Route::new("qualifier", "tournament/tournamentQualifier").named("tournamentQualifier"),
                Route::new("bracket", "tournament/tournamentBracket").named("tournamentBracket"),
                Route::new("ranking", "tournament/tournamentRanking").named("tournamentRanking"),
            ]),
        Route::new("/t/:tid/match/:matchId", "tournament/matchDetail")
            .named("matchDetail")
            .with_props(),
        Route::new("/t/:tid/referee/:matchId", "tournament/refereeWorkbench")
            .named("refereeWorkbench")
            .with_props()
            .requires_staff(),
    ]
}
