use anyhow::{Context, Result};
use rusqlite::Connection;

/// Relational model: three dimension tables plus one fact table keyed on
/// `(player_id, team_id, season)`, and an audit table bracketing each
/// ingestion run. Dimensions are created lazily during ingestion and never
/// deleted by the pipeline; deletes are RESTRICTed while facts reference
/// them, surrogate-key renames CASCADE.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;

        CREATE TABLE IF NOT EXISTS leagues (
            league_id INTEGER PRIMARY KEY AUTOINCREMENT,
            league_name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS teams (
            team_id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_name TEXT NOT NULL,
            league_id INTEGER NOT NULL
                REFERENCES leagues(league_id)
                ON UPDATE CASCADE ON DELETE RESTRICT,
            UNIQUE(team_name, league_id)
        );

        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_name TEXT NOT NULL,
            nationality TEXT NOT NULL DEFAULT '',
            primary_position TEXT NULL,
            UNIQUE(player_name, nationality)
        );

        CREATE TABLE IF NOT EXISTS player_stats (
            stat_id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL
                REFERENCES players(player_id)
                ON UPDATE CASCADE ON DELETE RESTRICT,
            team_id INTEGER NOT NULL
                REFERENCES teams(team_id)
                ON UPDATE CASCADE ON DELETE RESTRICT,
            league_id INTEGER NOT NULL
                REFERENCES leagues(league_id)
                ON UPDATE CASCADE ON DELETE RESTRICT,
            season TEXT NOT NULL,
            position TEXT NOT NULL DEFAULT '',
            apps INTEGER NOT NULL DEFAULT 0,
            starts INTEGER NOT NULL DEFAULT 0,
            minutes INTEGER NOT NULL DEFAULT 0,
            goals INTEGER NOT NULL DEFAULT 0,
            assists INTEGER NOT NULL DEFAULT 0,
            np_goals INTEGER NOT NULL DEFAULT 0,
            penalties INTEGER NOT NULL DEFAULT 0,
            penalty_att INTEGER NOT NULL DEFAULT 0,
            yellow_cards INTEGER NOT NULL DEFAULT 0,
            red_cards INTEGER NOT NULL DEFAULT 0,
            xg REAL NOT NULL DEFAULT 0,
            xa REAL NOT NULL DEFAULT 0,
            npxg REAL NOT NULL DEFAULT 0,
            shots INTEGER NOT NULL DEFAULT 0,
            shots_on_target INTEGER NOT NULL DEFAULT 0,
            key_passes INTEGER NOT NULL DEFAULT 0,
            dribbles INTEGER NOT NULL DEFAULT 0,
            tackles INTEGER NOT NULL DEFAULT 0,
            tackles_won INTEGER NOT NULL DEFAULT 0,
            interceptions INTEGER NOT NULL DEFAULT 0,
            blocks INTEGER NOT NULL DEFAULT 0,
            clearances INTEGER NOT NULL DEFAULT 0,
            errors INTEGER NOT NULL DEFAULT 0,
            touches INTEGER NOT NULL DEFAULT 0,
            passes_completed INTEGER NOT NULL DEFAULT 0,
            passes_attempted INTEGER NOT NULL DEFAULT 0,
            passes_into_pen_area INTEGER NOT NULL DEFAULT 0,
            progressive_passes INTEGER NOT NULL DEFAULT 0,
            progressive_carries INTEGER NOT NULL DEFAULT 0,
            progressive_receptions INTEGER NOT NULL DEFAULT 0,
            shot_creating_actions INTEGER NOT NULL DEFAULT 0,
            goal_creating_actions INTEGER NOT NULL DEFAULT 0,
            fouls_committed INTEGER NOT NULL DEFAULT 0,
            fouls_drawn INTEGER NOT NULL DEFAULT 0,
            offsides INTEGER NOT NULL DEFAULT 0,
            penalties_won INTEGER NOT NULL DEFAULT 0,
            penalties_conceded INTEGER NOT NULL DEFAULT 0,
            own_goals INTEGER NOT NULL DEFAULT 0,
            recoveries INTEGER NOT NULL DEFAULT 0,
            miscontrols INTEGER NOT NULL DEFAULT 0,
            dispossessed INTEGER NOT NULL DEFAULT 0,
            carries INTEGER NOT NULL DEFAULT 0,
            goals_against INTEGER NOT NULL DEFAULT 0,
            shots_on_target_against INTEGER NOT NULL DEFAULT 0,
            saves INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            draws INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0,
            clean_sheets INTEGER NOT NULL DEFAULT 0,
            penalty_kicks_faced INTEGER NOT NULL DEFAULT 0,
            penalty_kicks_saved INTEGER NOT NULL DEFAULT 0,
            penalty_kicks_missed_against INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            UNIQUE(player_id, team_id, season)
        );
        CREATE INDEX IF NOT EXISTS idx_player_stats_season ON player_stats(season);
        CREATE INDEX IF NOT EXISTS idx_player_stats_league ON player_stats(league_id);
        CREATE INDEX IF NOT EXISTS idx_player_stats_team ON player_stats(team_id);
        CREATE INDEX IF NOT EXISTS idx_player_stats_minutes ON player_stats(minutes);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            season TEXT NOT NULL,
            csv_path TEXT NOT NULL,
            rows_processed INTEGER NOT NULL,
            rows_skipped INTEGER NOT NULL,
            facts_upserted INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}
