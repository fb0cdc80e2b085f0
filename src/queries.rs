//! Consumption boundary: filtered reads of stored facts, joined back to
//! their dimension names. The presentation tier calls these on a read-only
//! connection and feeds the rows to `metrics`. No-match filters return
//! empty vectors, never errors.

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

/// One fact row with dimension names resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSeasonRow {
    pub stat_id: i64,
    pub season: String,
    pub league_name: String,
    pub team_name: String,
    pub player_name: String,
    pub nationality: String,
    pub position: String,
    pub apps: i64,
    pub starts: i64,
    pub minutes: i64,
    pub goals: i64,
    pub assists: i64,
    pub np_goals: i64,
    pub penalties: i64,
    pub penalty_att: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub xg: f64,
    pub xa: f64,
    pub npxg: f64,
    pub shots: i64,
    pub shots_on_target: i64,
    pub key_passes: i64,
    pub dribbles: i64,
    pub tackles: i64,
    pub tackles_won: i64,
    pub interceptions: i64,
    pub blocks: i64,
    pub clearances: i64,
    pub errors: i64,
    pub touches: i64,
    pub passes_completed: i64,
    pub passes_attempted: i64,
    pub passes_into_pen_area: i64,
    pub progressive_passes: i64,
    pub progressive_carries: i64,
    pub progressive_receptions: i64,
    pub shot_creating_actions: i64,
    pub goal_creating_actions: i64,
    pub fouls_committed: i64,
    pub fouls_drawn: i64,
    pub offsides: i64,
    pub penalties_won: i64,
    pub penalties_conceded: i64,
    pub own_goals: i64,
    pub recoveries: i64,
    pub miscontrols: i64,
    pub dispossessed: i64,
    pub carries: i64,
    pub goals_against: i64,
    pub shots_on_target_against: i64,
    pub saves: i64,
    pub wins: i64,
    pub draws: i64,
    pub losses: i64,
    pub clean_sheets: i64,
    pub penalty_kicks_faced: i64,
    pub penalty_kicks_saved: i64,
    pub penalty_kicks_missed_against: i64,
}

/// Season/league/team/position selection plus the globally consistent
/// minimum-minutes threshold. Empty lists mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct StatFilter {
    pub season: String,
    pub leagues: Vec<String>,
    pub teams: Vec<String>,
    pub positions: Vec<String>,
    pub min_minutes: i64,
}

impl StatFilter {
    pub fn new(season: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            ..Self::default()
        }
    }
}

const PLAYER_COLUMNS_SQL: &str = r#"
    ps.stat_id, ps.season, l.league_name, t.team_name, p.player_name,
    p.nationality, ps.position,
    ps.apps, ps.starts, ps.minutes, ps.goals, ps.assists, ps.np_goals,
    ps.penalties, ps.penalty_att, ps.yellow_cards, ps.red_cards,
    ps.xg, ps.xa, ps.npxg, ps.shots, ps.shots_on_target, ps.key_passes,
    ps.dribbles, ps.tackles, ps.tackles_won, ps.interceptions, ps.blocks,
    ps.clearances, ps.errors, ps.touches, ps.passes_completed,
    ps.passes_attempted, ps.passes_into_pen_area, ps.progressive_passes,
    ps.progressive_carries, ps.progressive_receptions,
    ps.shot_creating_actions, ps.goal_creating_actions, ps.fouls_committed,
    ps.fouls_drawn, ps.offsides, ps.penalties_won, ps.penalties_conceded,
    ps.own_goals, ps.recoveries, ps.miscontrols, ps.dispossessed, ps.carries,
    ps.goals_against, ps.shots_on_target_against, ps.saves, ps.wins,
    ps.draws, ps.losses, ps.clean_sheets, ps.penalty_kicks_faced,
    ps.penalty_kicks_saved, ps.penalty_kicks_missed_against
"#;

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

fn build_filters(filter: &StatFilter) -> (String, Vec<Value>) {
    let mut clauses = vec!["ps.season = ?".to_string(), "ps.minutes >= ?".to_string()];
    let mut params: Vec<Value> = vec![
        Value::from(filter.season.clone()),
        Value::from(filter.min_minutes),
    ];
    if !filter.leagues.is_empty() {
        clauses.push(format!(
            "l.league_name IN ({})",
            placeholders(filter.leagues.len())
        ));
        params.extend(filter.leagues.iter().cloned().map(Value::from));
    }
    if !filter.teams.is_empty() {
        clauses.push(format!(
            "t.team_name IN ({})",
            placeholders(filter.teams.len())
        ));
        params.extend(filter.teams.iter().cloned().map(Value::from));
    }
    if !filter.positions.is_empty() {
        clauses.push(format!(
            "ps.position IN ({})",
            placeholders(filter.positions.len())
        ));
        params.extend(filter.positions.iter().cloned().map(Value::from));
    }
    (clauses.join(" AND "), params)
}

pub fn fetch_player_stats(conn: &Connection, filter: &StatFilter) -> Result<Vec<PlayerSeasonRow>> {
    let (where_clause, params) = build_filters(filter);
    let sql = format!(
        "SELECT {PLAYER_COLUMNS_SQL}
         FROM player_stats ps
         JOIN players p ON ps.player_id = p.player_id
         JOIN teams t ON ps.team_id = t.team_id
         JOIN leagues l ON ps.league_id = l.league_id
         WHERE {where_clause}
         ORDER BY p.player_name ASC, t.team_name ASC"
    );
    let mut stmt = conn.prepare(&sql).context("prepare player stats query")?;
    let rows = stmt
        .query_map(params_from_iter(params), decode_row)
        .context("query player stats")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player stats row")?);
    }
    Ok(out)
}

fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlayerSeasonRow> {
    Ok(PlayerSeasonRow {
        stat_id: row.get(0)?,
        season: row.get(1)?,
        league_name: row.get(2)?,
        team_name: row.get(3)?,
        player_name: row.get(4)?,
        nationality: row.get(5)?,
        position: row.get(6)?,
        apps: row.get(7)?,
        starts: row.get(8)?,
        minutes: row.get(9)?,
        goals: row.get(10)?,
        assists: row.get(11)?,
        np_goals: row.get(12)?,
        penalties: row.get(13)?,
        penalty_att: row.get(14)?,
        yellow_cards: row.get(15)?,
        red_cards: row.get(16)?,
        xg: row.get(17)?,
        xa: row.get(18)?,
        npxg: row.get(19)?,
        shots: row.get(20)?,
        shots_on_target: row.get(21)?,
        key_passes: row.get(22)?,
        dribbles: row.get(23)?,
        tackles: row.get(24)?,
        tackles_won: row.get(25)?,
        interceptions: row.get(26)?,
        blocks: row.get(27)?,
        clearances: row.get(28)?,
        errors: row.get(29)?,
        touches: row.get(30)?,
        passes_completed: row.get(31)?,
        passes_attempted: row.get(32)?,
        passes_into_pen_area: row.get(33)?,
        progressive_passes: row.get(34)?,
        progressive_carries: row.get(35)?,
        progressive_receptions: row.get(36)?,
        shot_creating_actions: row.get(37)?,
        goal_creating_actions: row.get(38)?,
        fouls_committed: row.get(39)?,
        fouls_drawn: row.get(40)?,
        offsides: row.get(41)?,
        penalties_won: row.get(42)?,
        penalties_conceded: row.get(43)?,
        own_goals: row.get(44)?,
        recoveries: row.get(45)?,
        miscontrols: row.get(46)?,
        dispossessed: row.get(47)?,
        carries: row.get(48)?,
        goals_against: row.get(49)?,
        shots_on_target_against: row.get(50)?,
        saves: row.get(51)?,
        wins: row.get(52)?,
        draws: row.get(53)?,
        losses: row.get(54)?,
        clean_sheets: row.get(55)?,
        penalty_kicks_faced: row.get(56)?,
        penalty_kicks_saved: row.get(57)?,
        penalty_kicks_missed_against: row.get(58)?,
    })
}

fn collect_strings(conn: &Connection, sql: &str, params: Vec<Value>) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql).context("prepare enumeration query")?;
    let rows = stmt
        .query_map(params_from_iter(params), |row| row.get::<_, String>(0))
        .context("query enumeration")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode enumeration row")?);
    }
    Ok(out)
}

pub fn list_seasons(conn: &Connection) -> Result<Vec<String>> {
    collect_strings(
        conn,
        "SELECT DISTINCT season FROM player_stats ORDER BY season DESC",
        Vec::new(),
    )
}

pub fn list_leagues(conn: &Connection, season: &str) -> Result<Vec<String>> {
    collect_strings(
        conn,
        "SELECT DISTINCT l.league_name FROM player_stats ps
         JOIN leagues l ON ps.league_id = l.league_id
         WHERE ps.season = ? ORDER BY l.league_name",
        vec![Value::from(season.to_string())],
    )
}

pub fn list_teams(conn: &Connection, season: &str, leagues: &[String]) -> Result<Vec<String>> {
    let mut sql = "SELECT DISTINCT t.team_name FROM player_stats ps
         JOIN teams t ON ps.team_id = t.team_id
         JOIN leagues l ON ps.league_id = l.league_id
         WHERE ps.season = ?"
        .to_string();
    let mut params: Vec<Value> = vec![Value::from(season.to_string())];
    if !leagues.is_empty() {
        sql.push_str(&format!(
            " AND l.league_name IN ({})",
            placeholders(leagues.len())
        ));
        params.extend(leagues.iter().cloned().map(Value::from));
    }
    sql.push_str(" ORDER BY t.team_name");
    collect_strings(conn, &sql, params)
}

pub fn list_positions(conn: &Connection, season: &str) -> Result<Vec<String>> {
    collect_strings(
        conn,
        "SELECT DISTINCT position FROM player_stats
         WHERE position <> '' AND season = ? ORDER BY position",
        vec![Value::from(season.to_string())],
    )
}

/// Audit-table history of ingest runs, newest first.
pub fn list_ingest_runs(conn: &Connection) -> Result<Vec<IngestRunRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT run_id, started_at, finished_at, season, csv_path,
                    rows_processed, rows_skipped, facts_upserted
             FROM ingest_runs ORDER BY run_id DESC",
        )
        .context("prepare ingest runs query")?;
    let rows = stmt
        .query_map(params![], |row| {
            Ok(IngestRunRecord {
                run_id: row.get(0)?,
                started_at: row.get(1)?,
                finished_at: row.get(2)?,
                season: row.get(3)?,
                csv_path: row.get(4)?,
                rows_processed: row.get(5)?,
                rows_skipped: row.get(6)?,
                facts_upserted: row.get(7)?,
            })
        })
        .context("query ingest runs")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode ingest run row")?);
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct IngestRunRecord {
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub season: String,
    pub csv_path: String,
    pub rows_processed: i64,
    pub rows_skipped: i64,
    pub facts_upserted: i64,
}
