use fbref_stats::metrics::{
    self, DEFAULT_MIN_MINUTES, clean_sheet_pct, defensive_actions, leaderboard, league_average,
    pass_pct, pct, per90, save_pct, team_average,
};
use fbref_stats::queries::PlayerSeasonRow;

fn row(name: &str, team: &str, league: &str, minutes: i64, goals: i64) -> PlayerSeasonRow {
    PlayerSeasonRow {
        player_name: name.to_string(),
        team_name: team.to_string(),
        league_name: league.to_string(),
        season: "2024-2025".to_string(),
        minutes,
        goals,
        ..PlayerSeasonRow::default()
    }
}

#[test]
fn per90_is_identity_at_ninety_minutes() {
    assert_eq!(per90(6.0, 90), 6.0);
    assert_eq!(per90(0.0, 90), 0.0);
    // Half a match doubles the rate.
    assert_eq!(per90(3.0, 45), 6.0);
}

#[test]
fn per90_guards_zero_minutes() {
    assert_eq!(per90(4.0, 0), per90(4.0, 1));
    assert!(per90(4.0, 0).is_finite());
}

#[test]
fn pct_is_none_for_empty_denominator() {
    assert_eq!(pct(5.0, 0.0), None);
    assert_eq!(pct(5.0, -1.0), None);
    assert_eq!(pct(5.0, 10.0), Some(50.0));
}

#[test]
fn kpi_wrappers_use_the_right_columns() {
    let mut r = row("Gk", "Inter", "Serie A", 2700, 0);
    r.passes_completed = 80;
    r.passes_attempted = 100;
    r.saves = 70;
    r.shots_on_target_against = 90;
    r.clean_sheets = 12;
    r.apps = 30;
    assert_eq!(pass_pct(&r), Some(80.0));
    assert_eq!(save_pct(&r), Some(70.0 / 90.0 * 100.0));
    assert_eq!(clean_sheet_pct(&r), Some(40.0));

    let bench = row("Sub", "Inter", "Serie A", 0, 0);
    assert_eq!(pass_pct(&bench), None);
    assert_eq!(save_pct(&bench), None);
    assert_eq!(clean_sheet_pct(&bench), None);
}

#[test]
fn defensive_actions_is_tackles_plus_interceptions() {
    let mut r = row("Mid", "Chelsea", "Premier League", 900, 1);
    r.tackles = 40;
    r.interceptions = 25;
    assert_eq!(defensive_actions(&r), 65);
}

#[test]
fn min_minutes_filter_is_exact() {
    let rows = vec![
        row("Starter", "Arsenal", "Premier League", 900, 6),
        row("Cameo", "Arsenal", "Premier League", 86, 3),
        row("Rotation", "Arsenal", "Premier League", 450, 3),
    ];
    let goals = |r: &PlayerSeasonRow| r.goals as f64;

    // 86 minutes is below the default threshold; 450 qualifies exactly.
    let strict = team_average(&rows, "Arsenal", goals, DEFAULT_MIN_MINUTES).unwrap();
    assert_eq!(strict, 4.5);

    let inclusive = team_average(&rows, "Arsenal", goals, 0).unwrap();
    assert_eq!(inclusive, 4.0);
}

#[test]
fn team_average_is_none_when_nobody_qualifies() {
    let rows = vec![row("Cameo", "Arsenal", "Premier League", 86, 3)];
    let goals = |r: &PlayerSeasonRow| r.goals as f64;
    assert_eq!(team_average(&rows, "Arsenal", goals, 450), None);
    assert_eq!(team_average(&rows, "Nonexistent FC", goals, 0), None);
}

#[test]
fn league_average_is_mean_of_team_means() {
    // Arsenal: mean 4.0 over two players; Chelsea: mean 1.0 over one.
    // A straight player mean would be 3.0; the team-weighted mean is 2.5.
    let rows = vec![
        row("A1", "Arsenal", "Premier League", 900, 6),
        row("A2", "Arsenal", "Premier League", 900, 2),
        row("C1", "Chelsea", "Premier League", 900, 1),
        row("X1", "Inter", "Serie A", 900, 9),
    ];
    let goals = |r: &PlayerSeasonRow| r.goals as f64;
    assert_eq!(
        league_average(&rows, "Premier League", goals, 450),
        Some(2.5)
    );
    assert_eq!(league_average(&rows, "Serie A", goals, 450), Some(9.0));
    assert_eq!(league_average(&rows, "Bundesliga", goals, 450), None);
}

#[test]
fn leaderboard_orders_descending_and_truncates() {
    let rows = vec![
        row("Low", "A", "L", 900, 2),
        row("High", "A", "L", 900, 9),
        row("Mid", "A", "L", 900, 5),
        row("Benched", "A", "L", 100, 99),
    ];
    let goals = |r: &PlayerSeasonRow| r.goals as f64;
    let board = leaderboard(&rows, goals, 2, 450);
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].row.player_name, "High");
    assert_eq!(board[1].row.player_name, "Mid");
}

#[test]
fn leaderboard_ties_break_by_player_name() {
    let mut rows = vec![
        row("Zola", "A", "L", 900, 7),
        row("Anders", "A", "L", 900, 7),
        row("Mikel", "A", "L", 900, 7),
    ];
    let goals = |r: &PlayerSeasonRow| r.goals as f64;
    let board = leaderboard(&rows, goals, 3, 0);
    let names: Vec<&str> = board.iter().map(|e| e.row.player_name.as_str()).collect();
    assert_eq!(names, vec!["Anders", "Mikel", "Zola"]);

    // Same ranking regardless of input order.
    rows.reverse();
    let board = leaderboard(&rows, goals, 3, 0);
    let names: Vec<&str> = board.iter().map(|e| e.row.player_name.as_str()).collect();
    assert_eq!(names, vec!["Anders", "Mikel", "Zola"]);
}

#[test]
fn metric_names_all_resolve() {
    for name in metrics::METRIC_NAMES {
        assert!(metrics::metric_by_name(name).is_some(), "{name}");
    }
    assert!(metrics::metric_by_name("nutmegs").is_none());
}

#[test]
fn per90_composes_with_metrics() {
    let mut r = row("Fwd", "Arsenal", "Premier League", 1620, 9);
    r.xg = 7.5;
    assert_eq!(per90(r.goals as f64, r.minutes), 9.0 / 1620.0 * 90.0);
    assert_eq!(per90(r.xg, r.minutes), 7.5 / 1620.0 * 90.0);
}
