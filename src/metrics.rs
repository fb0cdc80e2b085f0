//! Derived metrics over stored fact rows. Everything here is pure: rows in,
//! numbers out, no storage access, so results are safe to memoize upstream.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::queries::PlayerSeasonRow;

/// Players below this many minutes are excluded from aggregates unless the
/// caller overrides the threshold. Applied identically across every view.
pub const DEFAULT_MIN_MINUTES: i64 = 450;

/// Normalize a counting stat to a 90-minute-equivalent rate. Zero minutes
/// are clamped to one so an unused substitute yields a finite rate.
pub fn per90(metric: f64, minutes: i64) -> f64 {
    metric / minutes.max(1) as f64 * 90.0
}

/// Percentage KPI; `None` when the denominator is not positive, so an empty
/// denominator renders as missing rather than a fake 0% or a division error.
pub fn pct(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator * 100.0)
    } else {
        None
    }
}

/// Tackles + interceptions. Proxy for defensive workload; true pressure
/// counts are not in the source feed.
pub fn defensive_actions(row: &PlayerSeasonRow) -> i64 {
    row.tackles + row.interceptions
}

pub fn pass_pct(row: &PlayerSeasonRow) -> Option<f64> {
    pct(row.passes_completed as f64, row.passes_attempted as f64)
}

pub fn save_pct(row: &PlayerSeasonRow) -> Option<f64> {
    pct(row.saves as f64, row.shots_on_target_against as f64)
}

pub fn clean_sheet_pct(row: &PlayerSeasonRow) -> Option<f64> {
    pct(row.clean_sheets as f64, row.apps as f64)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Mean of a metric across a team's players at or above `min_minutes`.
/// `None` when no player qualifies.
pub fn team_average<F>(
    rows: &[PlayerSeasonRow],
    team_name: &str,
    metric: F,
    min_minutes: i64,
) -> Option<f64>
where
    F: Fn(&PlayerSeasonRow) -> f64,
{
    let values: Vec<f64> = rows
        .iter()
        .filter(|r| r.team_name == team_name && r.minutes >= min_minutes)
        .map(|r| metric(r))
        .collect();
    mean(&values)
}

/// Mean across the league's team averages, so a large squad does not
/// outweigh a small one.
pub fn league_average<F>(
    rows: &[PlayerSeasonRow],
    league_name: &str,
    metric: F,
    min_minutes: i64,
) -> Option<f64>
where
    F: Fn(&PlayerSeasonRow) -> f64,
{
    let teams: BTreeSet<&str> = rows
        .iter()
        .filter(|r| r.league_name == league_name)
        .map(|r| r.team_name.as_str())
        .collect();
    let mut team_means = Vec::with_capacity(teams.len());
    for team in teams {
        let values: Vec<f64> = rows
            .iter()
            .filter(|r| {
                r.league_name == league_name && r.team_name == team && r.minutes >= min_minutes
            })
            .map(|r| metric(r))
            .collect();
        if let Some(m) = mean(&values) {
            team_means.push(m);
        }
    }
    mean(&team_means)
}

#[derive(Debug, Clone)]
pub struct LeaderboardEntry<'a> {
    pub row: &'a PlayerSeasonRow,
    pub value: f64,
}

/// Top-N rows by a metric, descending. Ties break by ascending player name
/// so repeated calls rank identically.
pub fn leaderboard<'a, F>(
    rows: &'a [PlayerSeasonRow],
    metric: F,
    top_n: usize,
    min_minutes: i64,
) -> Vec<LeaderboardEntry<'a>>
where
    F: Fn(&PlayerSeasonRow) -> f64,
{
    let mut entries: Vec<LeaderboardEntry<'a>> = rows
        .iter()
        .filter(|r| r.minutes >= min_minutes)
        .map(|row| LeaderboardEntry {
            value: metric(row),
            row,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.row.player_name.cmp(&b.row.player_name))
    });
    entries.truncate(top_n);
    entries
}

/// Metrics addressable by name from the CLI.
pub const METRIC_NAMES: &[&str] = &[
    "goals",
    "assists",
    "np_goals",
    "xg",
    "xa",
    "npxg",
    "shots",
    "shots_on_target",
    "key_passes",
    "dribbles",
    "tackles",
    "interceptions",
    "def_actions",
    "progressive_passes",
    "progressive_carries",
    "touches",
    "minutes",
    "saves",
    "clean_sheets",
];

pub fn metric_by_name(name: &str) -> Option<fn(&PlayerSeasonRow) -> f64> {
    Some(match name {
        "goals" => |r: &PlayerSeasonRow| r.goals as f64,
        "assists" => |r: &PlayerSeasonRow| r.assists as f64,
        "np_goals" => |r: &PlayerSeasonRow| r.np_goals as f64,
        "xg" => |r: &PlayerSeasonRow| r.xg,
        "xa" => |r: &PlayerSeasonRow| r.xa,
        "npxg" => |r: &PlayerSeasonRow| r.npxg,
        "shots" => |r: &PlayerSeasonRow| r.shots as f64,
        "shots_on_target" => |r: &PlayerSeasonRow| r.shots_on_target as f64,
        "key_passes" => |r: &PlayerSeasonRow| r.key_passes as f64,
        "dribbles" => |r: &PlayerSeasonRow| r.dribbles as f64,
        "tackles" => |r: &PlayerSeasonRow| r.tackles as f64,
        "interceptions" => |r: &PlayerSeasonRow| r.interceptions as f64,
        "def_actions" => |r: &PlayerSeasonRow| defensive_actions(r) as f64,
        "progressive_passes" => |r: &PlayerSeasonRow| r.progressive_passes as f64,
        "progressive_carries" => |r: &PlayerSeasonRow| r.progressive_carries as f64,
        "touches" => |r: &PlayerSeasonRow| r.touches as f64,
        "minutes" => |r: &PlayerSeasonRow| r.minutes as f64,
        "saves" => |r: &PlayerSeasonRow| r.saves as f64,
        "clean_sheets" => |r: &PlayerSeasonRow| r.clean_sheets as f64,
        _ => return None,
    })
}
