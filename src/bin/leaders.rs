use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use fbref_stats::config;
use fbref_stats::metrics::{self, DEFAULT_MIN_MINUTES, METRIC_NAMES};
use fbref_stats::queries::{self, PlayerSeasonRow, StatFilter};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let metric_name = flag_value(&args, "--metric").unwrap_or_else(|| "goals".to_string());
    let metric = metrics::metric_by_name(&metric_name).ok_or_else(|| {
        anyhow!(
            "unknown metric {metric_name:?}; expected one of: {}",
            METRIC_NAMES.join(", ")
        )
    })?;
    let top = match flag_value(&args, "--top") {
        Some(raw) => raw.parse::<usize>().context("--top must be an integer")?,
        None => 10,
    };
    let min_minutes = match flag_value(&args, "--min-minutes") {
        Some(raw) => raw
            .parse::<i64>()
            .context("--min-minutes must be an integer")?,
        None => DEFAULT_MIN_MINUTES,
    };
    let rate = has_flag(&args, "--per90");

    let db_path = config::resolve_db_path(flag_value(&args, "--db").map(PathBuf::from))?;
    let conn = config::open_ro(&db_path)?;

    let season = match flag_value(&args, "--season") {
        Some(season) => season,
        None => queries::list_seasons(&conn)?
            .into_iter()
            .next()
            .context("no seasons ingested yet")?,
    };

    let mut filter = StatFilter::new(season.clone());
    filter.min_minutes = min_minutes;
    let rows = queries::fetch_player_stats(&conn, &filter)?;
    if rows.is_empty() {
        println!("No rows for season {season} at {min_minutes}+ minutes");
        return Ok(());
    }

    let value = |r: &PlayerSeasonRow| {
        if rate {
            metrics::per90(metric(r), r.minutes)
        } else {
            metric(r)
        }
    };
    let board = metrics::leaderboard(&rows, value, top, min_minutes);

    let label = if rate {
        format!("{metric_name} per 90")
    } else {
        metric_name.clone()
    };
    println!(
        "Top {} by {label} for season {season} ({min_minutes}+ minutes)",
        board.len()
    );
    for (rank, entry) in board.iter().enumerate() {
        println!(
            "{:>3}. {:<28} {:<22} {:>5} min  {:>8.2}",
            rank + 1,
            entry.row.player_name,
            entry.row.team_name,
            entry.row.minutes,
            entry.value
        );
    }

    Ok(())
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}
