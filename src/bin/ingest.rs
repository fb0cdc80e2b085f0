use std::path::PathBuf;

use anyhow::{Context, Result};

use fbref_stats::{config, ingest};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let csv = flag_value(&args, "--csv")
        .map(PathBuf::from)
        .context("--csv PATH is required")?;
    let season = flag_value(&args, "--season").context("--season LABEL is required")?;
    let batch_size = match flag_value(&args, "--batch-size") {
        Some(raw) => raw
            .parse::<usize>()
            .context("--batch-size must be a positive integer")?,
        None => ingest::DEFAULT_BATCH_SIZE,
    };

    let db_path = config::resolve_db_path(flag_value(&args, "--db").map(PathBuf::from))?;
    let mut conn = config::open_rw(&db_path)?;

    let mut opts = ingest::IngestOptions::new(csv, season);
    opts.batch_size = batch_size;
    let summary = ingest::ingest_csv(&mut conn, &opts)?;

    if has_flag(&args, "--json") {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serialize summary")?
        );
        return Ok(());
    }

    println!("Ingest complete for season {}", summary.season);
    println!("DB: {}", db_path.display());
    println!("CSV: {}", summary.csv_path.display());
    println!("Rows processed: {}", summary.rows_processed);
    println!("Rows skipped: {}", summary.rows_skipped);
    println!("Fields defaulted to 0: {}", summary.fields_defaulted);
    println!("Fact rows upserted: {}", summary.facts_upserted);
    println!("Final fact rows for season: {}", summary.final_fact_rows);
    println!(
        "Dimensions created: {} leagues, {} teams, {} players",
        summary.leagues_created, summary.teams_created, summary.players_created
    );
    println!("Batches committed: {}", summary.batches.len());
    if !summary.skipped.is_empty() {
        println!("Skipped rows:");
        for line in summary.skipped.iter().take(8) {
            println!(" - {line}");
        }
        if summary.skipped.len() > 8 {
            println!(" - and {} more", summary.skipped.len() - 8);
        }
    }

    Ok(())
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
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
