use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OpenFlags};

use crate::schema;

const APP_DIR: &str = "fbref_stats";
const DB_FILE: &str = "player_stats.sqlite";

/// Environment variable naming the database file. A `.env` file in the
/// working directory is honoured via dotenvy, matching the deployment
/// surface of the ingestion job.
pub const DB_ENV_VAR: &str = "FBREF_DB";

/// Resolve the database path: explicit argument beats `FBREF_DB` beats the
/// XDG cache default.
pub fn resolve_db_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    dotenvy::dotenv().ok();
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(raw) = std::env::var(DB_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    default_db_path().ok_or_else(|| {
        anyhow!("unable to resolve a database path; set {DB_ENV_VAR} or pass --db")
    })
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

/// Open the ingestion connection: read-write, creating the file and schema
/// on first use.
pub fn open_rw(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", true)
        .context("enable foreign keys")?;
    schema::init_schema(&conn)?;
    Ok(conn)
}

/// Open the consumption-side connection. Read-only flags stand in for the
/// less-privileged credential set of a client-server deployment: this handle
/// cannot write, regardless of what the caller does with it.
pub fn open_ro(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("open sqlite db read-only {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", true)
        .context("enable foreign keys")?;
    Ok(conn)
}

fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    // Fallback to ~/.cache on linux-like systems.
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}
