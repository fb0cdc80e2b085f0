//! CSV → SQLite fact loader.
//!
//! Source columns follow FBRef's "light" player export. Mapping:
//! `Player`/`Nation`/`Pos`/`Comp`/`Squad` → player/nationality/position/
//! league/team; `MP Starts Min Gls Ast G-PK PK PKatt CrdY CrdR` →
//! apps/starts/minutes/goals/assists/np_goals/penalties/penalty_att/
//! yellow_cards/red_cards; `xG xAG npxG` → xg/xa/npxg;
//! `Sh SoT KP Succ Tkl TklW Int Blocks Clr Err Touches` →
//! shots/shots_on_target/key_passes/dribbles/tackles/tackles_won/
//! interceptions/blocks/clearances/errors/touches;
//! `Cmp Att PPA PrgP PrgC PrgR SCA GCA` → passing/progression/creation;
//! `Fls Fld Off PKwon PKcon OG Recov Mis Dis Carries` → discipline and
//! possession; `GA SoTA Saves W D L CS PKsv PKm` → goalkeeping. The export
//! repeats `PKatt` when the keeper table is appended; the second occurrence
//! is penalty_kicks_faced.
//!
//! The season label is a run parameter and is never read from the rows.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use csv::StringRecord;
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::coerce;
use crate::dimensions::DimensionCache;

pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub csv_path: PathBuf,
    pub season: String,
    pub batch_size: usize,
}

impl IngestOptions {
    pub fn new(csv_path: impl Into<PathBuf>, season: impl Into<String>) -> Self {
        Self {
            csv_path: csv_path.into(),
            season: season.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// One committed batch.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchOutcome {
    pub index: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub season: String,
    pub csv_path: PathBuf,
    pub rows_processed: usize,
    pub rows_skipped: usize,
    pub fields_defaulted: usize,
    pub facts_upserted: usize,
    /// Stored fact rows for the season after the run; lower than
    /// `facts_upserted` when the CSV repeats a `(player, team)` pair.
    pub final_fact_rows: usize,
    pub leagues_created: usize,
    pub teams_created: usize,
    pub players_created: usize,
    pub batches: Vec<BatchOutcome>,
    /// One entry per skipped row: "row N: reason".
    pub skipped: Vec<String>,
}

/// Fully-typed fact row, season still unattached.
#[derive(Debug, Clone)]
struct FactRow {
    league: String,
    team: String,
    player: String,
    nationality: String,
    position: String,
    primary_position: String,
    apps: i64,
    starts: i64,
    minutes: i64,
    goals: i64,
    assists: i64,
    np_goals: i64,
    penalties: i64,
    penalty_att: i64,
    yellow_cards: i64,
    red_cards: i64,
    xg: f64,
    xa: f64,
    npxg: f64,
    shots: i64,
    shots_on_target: i64,
    key_passes: i64,
    dribbles: i64,
    tackles: i64,
    tackles_won: i64,
    interceptions: i64,
    blocks: i64,
    clearances: i64,
    errors: i64,
    touches: i64,
    passes_completed: i64,
    passes_attempted: i64,
    passes_into_pen_area: i64,
    progressive_passes: i64,
    progressive_carries: i64,
    progressive_receptions: i64,
    shot_creating_actions: i64,
    goal_creating_actions: i64,
    fouls_committed: i64,
    fouls_drawn: i64,
    offsides: i64,
    penalties_won: i64,
    penalties_conceded: i64,
    own_goals: i64,
    recoveries: i64,
    miscontrols: i64,
    dispossessed: i64,
    carries: i64,
    goals_against: i64,
    shots_on_target_against: i64,
    saves: i64,
    wins: i64,
    draws: i64,
    losses: i64,
    clean_sheets: i64,
    penalty_kicks_faced: i64,
    penalty_kicks_saved: i64,
    penalty_kicks_missed_against: i64,
    defaulted: usize,
}

/// Header name → every column index it appears at, in file order.
struct HeaderIndex(HashMap<String, Vec<usize>>);

impl HeaderIndex {
    fn new(headers: &StringRecord) -> Self {
        let mut map: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, name) in headers.iter().enumerate() {
            map.entry(name.trim().to_string()).or_default().push(i);
        }
        Self(map)
    }

    fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    fn field<'a>(&self, record: &'a StringRecord, name: &str) -> &'a str {
        self.field_nth(record, name, 0)
    }

    fn field_nth<'a>(&self, record: &'a StringRecord, name: &str, occurrence: usize) -> &'a str {
        self.0
            .get(name)
            .and_then(|cols| cols.get(occurrence))
            .and_then(|col| record.get(*col))
            .unwrap_or("")
    }
}

fn int_field(
    idx: &HeaderIndex,
    record: &StringRecord,
    name: &str,
    defaulted: &mut usize,
) -> Result<i64, String> {
    int_field_nth(idx, record, name, 0, defaulted)
}

fn int_field_nth(
    idx: &HeaderIndex,
    record: &StringRecord,
    name: &str,
    occurrence: usize,
    defaulted: &mut usize,
) -> Result<i64, String> {
    coerce::parse_int(idx.field_nth(record, name, occurrence))
        .resolve(0, defaulted)
        .map_err(|reason| format!("{name}: {reason}"))
}

fn real_field(
    idx: &HeaderIndex,
    record: &StringRecord,
    name: &str,
    defaulted: &mut usize,
) -> Result<f64, String> {
    coerce::parse_real(idx.field(record, name))
        .resolve(0.0, defaulted)
        .map_err(|reason| format!("{name}: {reason}"))
}

fn parse_fact(idx: &HeaderIndex, record: &StringRecord) -> Result<FactRow, String> {
    let player = idx.field(record, "Player").trim().to_string();
    let team = idx.field(record, "Squad").trim().to_string();
    let league = idx.field(record, "Comp").trim().to_string();
    if player.is_empty() {
        return Err("missing player name".to_string());
    }
    if team.is_empty() {
        return Err("missing team name".to_string());
    }
    if league.is_empty() {
        return Err("missing league name".to_string());
    }
    let nationality = idx.field(record, "Nation").trim().to_string();
    let position = idx.field(record, "Pos").trim().to_string();
    let primary_position = coerce::primary_position(&position);

    let mut d = 0usize;
    Ok(FactRow {
        league,
        team,
        player,
        nationality,
        position,
        primary_position,
        apps: int_field(idx, record, "MP", &mut d)?,
        starts: int_field(idx, record, "Starts", &mut d)?,
        minutes: int_field(idx, record, "Min", &mut d)?,
        goals: int_field(idx, record, "Gls", &mut d)?,
        assists: int_field(idx, record, "Ast", &mut d)?,
        np_goals: int_field(idx, record, "G-PK", &mut d)?,
        penalties: int_field(idx, record, "PK", &mut d)?,
        penalty_att: int_field(idx, record, "PKatt", &mut d)?,
        yellow_cards: int_field(idx, record, "CrdY", &mut d)?,
        red_cards: int_field(idx, record, "CrdR", &mut d)?,
        xg: real_field(idx, record, "xG", &mut d)?,
        xa: real_field(idx, record, "xAG", &mut d)?,
        npxg: real_field(idx, record, "npxG", &mut d)?,
        shots: int_field(idx, record, "Sh", &mut d)?,
        shots_on_target: int_field(idx, record, "SoT", &mut d)?,
        key_passes: int_field(idx, record, "KP", &mut d)?,
        dribbles: int_field(idx, record, "Succ", &mut d)?,
        tackles: int_field(idx, record, "Tkl", &mut d)?,
        tackles_won: int_field(idx, record, "TklW", &mut d)?,
        interceptions: int_field(idx, record, "Int", &mut d)?,
        blocks: int_field(idx, record, "Blocks", &mut d)?,
        clearances: int_field(idx, record, "Clr", &mut d)?,
        errors: int_field(idx, record, "Err", &mut d)?,
        touches: int_field(idx, record, "Touches", &mut d)?,
        passes_completed: int_field(idx, record, "Cmp", &mut d)?,
        passes_attempted: int_field(idx, record, "Att", &mut d)?,
        passes_into_pen_area: int_field(idx, record, "PPA", &mut d)?,
        progressive_passes: int_field(idx, record, "PrgP", &mut d)?,
        progressive_carries: int_field(idx, record, "PrgC", &mut d)?,
        progressive_receptions: int_field(idx, record, "PrgR", &mut d)?,
        shot_creating_actions: int_field(idx, record, "SCA", &mut d)?,
        goal_creating_actions: int_field(idx, record, "GCA", &mut d)?,
        fouls_committed: int_field(idx, record, "Fls", &mut d)?,
        fouls_drawn: int_field(idx, record, "Fld", &mut d)?,
        offsides: int_field(idx, record, "Off", &mut d)?,
        penalties_won: int_field(idx, record, "PKwon", &mut d)?,
        penalties_conceded: int_field(idx, record, "PKcon", &mut d)?,
        own_goals: int_field(idx, record, "OG", &mut d)?,
        recoveries: int_field(idx, record, "Recov", &mut d)?,
        miscontrols: int_field(idx, record, "Mis", &mut d)?,
        dispossessed: int_field(idx, record, "Dis", &mut d)?,
        carries: int_field(idx, record, "Carries", &mut d)?,
        goals_against: int_field(idx, record, "GA", &mut d)?,
        shots_on_target_against: int_field(idx, record, "SoTA", &mut d)?,
        saves: int_field(idx, record, "Saves", &mut d)?,
        wins: int_field(idx, record, "W", &mut d)?,
        draws: int_field(idx, record, "D", &mut d)?,
        losses: int_field(idx, record, "L", &mut d)?,
        clean_sheets: int_field(idx, record, "CS", &mut d)?,
        // Keeper table repeats the PKatt header; second occurrence.
        penalty_kicks_faced: int_field_nth(idx, record, "PKatt", 1, &mut d)?,
        penalty_kicks_saved: int_field(idx, record, "PKsv", &mut d)?,
        penalty_kicks_missed_against: int_field(idx, record, "PKm", &mut d)?,
        defaulted: d,
    })
}

/// Run one single-pass ingestion: parse every row, then upsert in
/// fixed-size batches, one transaction per batch. A malformed row is
/// reported with its row number and skipped; storage errors abort the run.
/// Re-running on the same CSV/season is idempotent.
pub fn ingest_csv(conn: &mut Connection, opts: &IngestOptions) -> Result<IngestSummary> {
    if !opts.csv_path.exists() {
        return Err(anyhow!("csv file not found: {}", opts.csv_path.display()));
    }
    if opts.season.trim().is_empty() {
        return Err(anyhow!("season label must not be empty"));
    }

    let mut reader = csv::Reader::from_path(&opts.csv_path)
        .with_context(|| format!("open csv {}", opts.csv_path.display()))?;
    let headers = reader.headers().context("read csv header")?.clone();
    let idx = HeaderIndex::new(&headers);
    for required in ["Player", "Squad", "Comp"] {
        if !idx.contains(required) {
            return Err(anyhow!("csv is missing required column {required:?}"));
        }
    }

    let mut pending: Vec<FactRow> = Vec::new();
    let mut skipped: Vec<String> = Vec::new();
    let mut fields_defaulted = 0usize;
    for (i, record) in reader.records().enumerate() {
        // Header occupies line 1.
        let row_no = i + 2;
        // A record the csv crate rejects (ragged field count, bad quoting)
        // is a malformed row, not a fatal run error.
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                skipped.push(format!("row {row_no}: {err}"));
                continue;
            }
        };
        match parse_fact(&idx, &record) {
            Ok(fact) => {
                fields_defaulted += fact.defaulted;
                pending.push(fact);
            }
            Err(reason) => skipped.push(format!("row {row_no}: {reason}")),
        }
    }

    let started_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO ingest_runs (started_at, finished_at, season, csv_path,
                                  rows_processed, rows_skipped, facts_upserted, errors_json)
         VALUES (?1, NULL, ?2, ?3, 0, 0, 0, '[]')",
        params![
            started_at,
            opts.season,
            opts.csv_path.display().to_string()
        ],
    )
    .context("insert ingest run")?;
    let run_id = conn.last_insert_rowid();

    let mut cache = DimensionCache::load_existing(conn)?;
    let mut batches: Vec<BatchOutcome> = Vec::new();
    let mut facts_upserted = 0usize;
    for (index, chunk) in pending.chunks(opts.batch_size.max(1)).enumerate() {
        let tx = conn.transaction().context("begin ingest batch")?;
        for fact in chunk {
            let league_id = cache.resolve_league(&tx, &fact.league)?;
            let team_id = cache.resolve_team(&tx, &fact.team, league_id)?;
            let player_id =
                cache.resolve_player(&tx, &fact.player, &fact.nationality, &fact.primary_position)?;
            upsert_fact(&tx, player_id, team_id, league_id, &opts.season, fact)?;
            facts_upserted += 1;
        }
        tx.commit().context("commit ingest batch")?;
        batches.push(BatchOutcome {
            index,
            rows: chunk.len(),
        });
    }

    let final_fact_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM player_stats WHERE season = ?1",
            params![opts.season],
            |row| row.get(0),
        )
        .context("count stored fact rows")?;

    let finished_at = Utc::now().to_rfc3339();
    let errors_json = serde_json::to_string(&skipped).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?1, rows_processed = ?2, rows_skipped = ?3,
             facts_upserted = ?4, errors_json = ?5
         WHERE run_id = ?6",
        params![
            finished_at,
            pending.len() as i64,
            skipped.len() as i64,
            facts_upserted as i64,
            errors_json,
            run_id
        ],
    )
    .context("update ingest run")?;

    Ok(IngestSummary {
        season: opts.season.clone(),
        csv_path: opts.csv_path.clone(),
        rows_processed: pending.len(),
        rows_skipped: skipped.len(),
        fields_defaulted,
        facts_upserted,
        final_fact_rows: final_fact_rows as usize,
        leagues_created: cache.leagues_created,
        teams_created: cache.teams_created,
        players_created: cache.players_created,
        batches,
        skipped,
    })
}

/// Values-authoritative upsert: a conflicting `(player, team, season)` row
/// has every stat column overwritten, never accumulated.
fn upsert_fact(
    conn: &Connection,
    player_id: i64,
    team_id: i64,
    league_id: i64,
    season: &str,
    f: &FactRow,
) -> Result<()> {
    let mut stmt = conn
        .prepare_cached(
            r#"
        INSERT INTO player_stats (
            player_id, team_id, league_id, season, position,
            apps, starts, minutes, goals, assists, np_goals, penalties,
            penalty_att, yellow_cards, red_cards, xg, xa, npxg, shots,
            shots_on_target, key_passes, dribbles, tackles, tackles_won,
            interceptions, blocks, clearances, errors, touches,
            passes_completed, passes_attempted, passes_into_pen_area,
            progressive_passes, progressive_carries, progressive_receptions,
            shot_creating_actions, goal_creating_actions, fouls_committed,
            fouls_drawn, offsides, penalties_won, penalties_conceded,
            own_goals, recoveries, miscontrols, dispossessed, carries,
            goals_against, shots_on_target_against, saves, wins, draws,
            losses, clean_sheets, penalty_kicks_faced, penalty_kicks_saved,
            penalty_kicks_missed_against, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16, ?17, ?18, ?19,
            ?20, ?21, ?22, ?23, ?24,
            ?25, ?26, ?27, ?28, ?29,
            ?30, ?31, ?32,
            ?33, ?34, ?35,
            ?36, ?37, ?38,
            ?39, ?40, ?41, ?42,
            ?43, ?44, ?45, ?46, ?47,
            ?48, ?49, ?50, ?51, ?52,
            ?53, ?54, ?55, ?56,
            ?57, ?58
        )
        ON CONFLICT(player_id, team_id, season) DO UPDATE SET
            league_id = excluded.league_id,
            position = excluded.position,
            apps = excluded.apps,
            starts = excluded.starts,
            minutes = excluded.minutes,
            goals = excluded.goals,
            assists = excluded.assists,
            np_goals = excluded.np_goals,
            penalties = excluded.penalties,
            penalty_att = excluded.penalty_att,
            yellow_cards = excluded.yellow_cards,
            red_cards = excluded.red_cards,
            xg = excluded.xg,
            xa = excluded.xa,
            npxg = excluded.npxg,
            shots = excluded.shots,
            shots_on_target = excluded.shots_on_target,
            key_passes = excluded.key_passes,
            dribbles = excluded.dribbles,
            tackles = excluded.tackles,
            tackles_won = excluded.tackles_won,
            interceptions = excluded.interceptions,
            blocks = excluded.blocks,
            clearances = excluded.clearances,
            errors = excluded.errors,
            touches = excluded.touches,
            passes_completed = excluded.passes_completed,
            passes_attempted = excluded.passes_attempted,
            passes_into_pen_area = excluded.passes_into_pen_area,
            progressive_passes = excluded.progressive_passes,
            progressive_carries = excluded.progressive_carries,
            progressive_receptions = excluded.progressive_receptions,
            shot_creating_actions = excluded.shot_creating_actions,
            goal_creating_actions = excluded.goal_creating_actions,
            fouls_committed = excluded.fouls_committed,
            fouls_drawn = excluded.fouls_drawn,
            offsides = excluded.offsides,
            penalties_won = excluded.penalties_won,
            penalties_conceded = excluded.penalties_conceded,
            own_goals = excluded.own_goals,
            recoveries = excluded.recoveries,
            miscontrols = excluded.miscontrols,
            dispossessed = excluded.dispossessed,
            carries = excluded.carries,
            goals_against = excluded.goals_against,
            shots_on_target_against = excluded.shots_on_target_against,
            saves = excluded.saves,
            wins = excluded.wins,
            draws = excluded.draws,
            losses = excluded.losses,
            clean_sheets = excluded.clean_sheets,
            penalty_kicks_faced = excluded.penalty_kicks_faced,
            penalty_kicks_saved = excluded.penalty_kicks_saved,
            penalty_kicks_missed_against = excluded.penalty_kicks_missed_against,
            updated_at = excluded.updated_at
        "#,
        )
        .context("prepare fact upsert")?;
    stmt.execute(params![
        player_id,
        team_id,
        league_id,
        season,
        f.position,
        f.apps,
        f.starts,
        f.minutes,
        f.goals,
        f.assists,
        f.np_goals,
        f.penalties,
        f.penalty_att,
        f.yellow_cards,
        f.red_cards,
        f.xg,
        f.xa,
        f.npxg,
        f.shots,
        f.shots_on_target,
        f.key_passes,
        f.dribbles,
        f.tackles,
        f.tackles_won,
        f.interceptions,
        f.blocks,
        f.clearances,
        f.errors,
        f.touches,
        f.passes_completed,
        f.passes_attempted,
        f.passes_into_pen_area,
        f.progressive_passes,
        f.progressive_carries,
        f.progressive_receptions,
        f.shot_creating_actions,
        f.goal_creating_actions,
        f.fouls_committed,
        f.fouls_drawn,
        f.offsides,
        f.penalties_won,
        f.penalties_conceded,
        f.own_goals,
        f.recoveries,
        f.miscontrols,
        f.dispossessed,
        f.carries,
        f.goals_against,
        f.shots_on_target_against,
        f.saves,
        f.wins,
        f.draws,
        f.losses,
        f.clean_sheets,
        f.penalty_kicks_faced,
        f.penalty_kicks_saved,
        f.penalty_kicks_missed_against,
        Utc::now().to_rfc3339(),
    ])
    .context("upsert player stat")?;
    Ok(())
}
