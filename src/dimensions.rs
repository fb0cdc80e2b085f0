use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

/// Natural-key → surrogate-id cache for one ingestion run.
///
/// Owned by the run, never shared: a second run builds its own cache. The
/// maps are unbounded but sized to the distinct dimension values of one CSV
/// (a few thousand entries at most for this domain).
#[derive(Debug, Default)]
pub struct DimensionCache {
    leagues: HashMap<String, i64>,
    teams: HashMap<(String, i64), i64>,
    players: HashMap<(String, String), i64>,
    /// Last primary position written per player, to skip no-op refreshes.
    positions: HashMap<i64, String>,
    pub leagues_created: usize,
    pub teams_created: usize,
    pub players_created: usize,
}

impl DimensionCache {
    /// Preload every existing dimension row so in-run resolution only hits
    /// the database for genuinely new values.
    pub fn load_existing(conn: &Connection) -> Result<Self> {
        let mut cache = Self::default();

        let mut stmt = conn
            .prepare("SELECT league_id, league_name FROM leagues")
            .context("prepare league preload")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .context("query league preload")?;
        for row in rows {
            let (id, name) = row.context("decode league row")?;
            cache.leagues.insert(name, id);
        }

        let mut stmt = conn
            .prepare("SELECT team_id, team_name, league_id FROM teams")
            .context("prepare team preload")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .context("query team preload")?;
        for row in rows {
            let (id, name, league_id) = row.context("decode team row")?;
            cache.teams.insert((name, league_id), id);
        }

        let mut stmt = conn
            .prepare("SELECT player_id, player_name, nationality, primary_position FROM players")
            .context("prepare player preload")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .context("query player preload")?;
        for row in rows {
            let (id, name, nationality, position) = row.context("decode player row")?;
            cache.players.insert((name, nationality), id);
            if let Some(position) = position {
                cache.positions.insert(id, position);
            }
        }

        Ok(cache)
    }

    /// Resolve or create a league by name. Insert-or-ignore then re-read:
    /// the created counters track actual inserts, so they stay exact even
    /// on a cold cache over a pre-populated database.
    pub fn resolve_league(&mut self, conn: &Connection, league_name: &str) -> Result<i64> {
        let name = league_name.trim();
        if let Some(id) = self.leagues.get(name) {
            return Ok(*id);
        }
        let inserted = conn
            .execute(
                "INSERT INTO leagues (league_name) VALUES (?1)
                 ON CONFLICT(league_name) DO NOTHING",
                params![name],
            )
            .with_context(|| format!("insert league {name:?}"))?;
        let id = if inserted == 1 {
            self.leagues_created += 1;
            conn.last_insert_rowid()
        } else {
            conn.query_row(
                "SELECT league_id FROM leagues WHERE league_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .with_context(|| format!("read league {name:?}"))?
        };
        self.leagues.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn resolve_team(
        &mut self,
        conn: &Connection,
        team_name: &str,
        league_id: i64,
    ) -> Result<i64> {
        let name = team_name.trim();
        let key = (name.to_string(), league_id);
        if let Some(id) = self.teams.get(&key) {
            return Ok(*id);
        }
        let inserted = conn
            .execute(
                "INSERT INTO teams (team_name, league_id) VALUES (?1, ?2)
                 ON CONFLICT(team_name, league_id) DO NOTHING",
                params![name, league_id],
            )
            .with_context(|| format!("insert team {name:?}"))?;
        let id = if inserted == 1 {
            self.teams_created += 1;
            conn.last_insert_rowid()
        } else {
            conn.query_row(
                "SELECT team_id FROM teams WHERE team_name = ?1 AND league_id = ?2",
                params![name, league_id],
                |row| row.get(0),
            )
            .with_context(|| format!("read team {name:?}"))?
        };
        self.teams.insert(key, id);
        Ok(id)
    }

    /// Player identity is the `(name, nationality)` pair; a transfer within
    /// a season resolves to the same player id under two teams. The latest
    /// sighting's primary position wins, with unchanged values skipped.
    pub fn resolve_player(
        &mut self,
        conn: &Connection,
        player_name: &str,
        nationality: &str,
        primary_position: &str,
    ) -> Result<i64> {
        let name = player_name.trim();
        let nationality = nationality.trim();
        let key = (name.to_string(), nationality.to_string());
        let position = if primary_position.is_empty() {
            None
        } else {
            Some(primary_position)
        };
        if let Some(id) = self.players.get(&key).copied() {
            self.refresh_position(conn, id, position)?;
            return Ok(id);
        }
        let inserted = conn
            .execute(
                "INSERT INTO players (player_name, nationality, primary_position)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(player_name, nationality) DO NOTHING",
                params![name, nationality, position],
            )
            .with_context(|| format!("insert player {name:?}"))?;
        let id = if inserted == 1 {
            self.players_created += 1;
            let id = conn.last_insert_rowid();
            if let Some(pos) = position {
                self.positions.insert(id, pos.to_string());
            }
            id
        } else {
            let id = conn
                .query_row(
                    "SELECT player_id FROM players
                     WHERE player_name = ?1 AND nationality = ?2",
                    params![name, nationality],
                    |row| row.get(0),
                )
                .with_context(|| format!("read player {name:?}"))?;
            self.refresh_position(conn, id, position)?;
            id
        };
        self.players.insert(key, id);
        Ok(id)
    }

    /// Write the primary position only when it differs from the last value
    /// written for this player; repeat sightings of the same role cost no
    /// write.
    fn refresh_position(
        &mut self,
        conn: &Connection,
        player_id: i64,
        position: Option<&str>,
    ) -> Result<()> {
        let Some(pos) = position else {
            return Ok(());
        };
        if self.positions.get(&player_id).map(String::as_str) == Some(pos) {
            return Ok(());
        }
        conn.execute(
            "UPDATE players SET primary_position = ?1 WHERE player_id = ?2",
            params![pos, player_id],
        )
        .context("refresh player position")?;
        self.positions.insert(player_id, pos.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::init_schema;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.pragma_update(None, "foreign_keys", true).unwrap();
        init_schema(&conn).expect("schema");
        conn
    }

    #[test]
    fn resolving_twice_returns_same_id_without_duplicates() {
        let conn = test_conn();
        let mut cache = DimensionCache::default();

        let league = cache.resolve_league(&conn, "Premier League").unwrap();
        let a = cache.resolve_team(&conn, "Arsenal", league).unwrap();
        let b = cache.resolve_team(&conn, "Arsenal", league).unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.teams_created, 1);

        let teams: i64 = conn
            .query_row("SELECT COUNT(*) FROM teams", [], |row| row.get(0))
            .unwrap();
        assert_eq!(teams, 1);
    }

    #[test]
    fn preload_avoids_recreating_rows() {
        let conn = test_conn();
        let mut first = DimensionCache::default();
        let league = first.resolve_league(&conn, "La Liga").unwrap();
        first.resolve_player(&conn, "Ana", "es ESP", "FW").unwrap();

        let mut second = DimensionCache::load_existing(&conn).unwrap();
        assert_eq!(second.resolve_league(&conn, "La Liga").unwrap(), league);
        assert_eq!(second.leagues_created, 0);
        assert_eq!(second.players_created, 0);
    }

    #[test]
    fn conflict_on_cold_cache_rereads_existing_id() {
        let conn = test_conn();
        let mut warm = DimensionCache::default();
        let id = warm.resolve_league(&conn, "Serie A").unwrap();

        // A cache that never saw the row still lands on the same id and
        // does not report a creation.
        let mut cold = DimensionCache::default();
        assert_eq!(cold.resolve_league(&conn, "Serie A").unwrap(), id);
        assert_eq!(cold.leagues_created, 0);
        let leagues: i64 = conn
            .query_row("SELECT COUNT(*) FROM leagues", [], |row| row.get(0))
            .unwrap();
        assert_eq!(leagues, 1);
    }

    #[test]
    fn cold_cache_counts_only_real_inserts() {
        let conn = test_conn();
        let mut warm = DimensionCache::default();
        let league = warm.resolve_league(&conn, "La Liga").unwrap();
        warm.resolve_team(&conn, "Sevilla", league).unwrap();
        warm.resolve_player(&conn, "Ana", "es ESP", "FW").unwrap();

        let mut cold = DimensionCache::default();
        let league = cold.resolve_league(&conn, "La Liga").unwrap();
        cold.resolve_team(&conn, "Sevilla", league).unwrap();
        cold.resolve_team(&conn, "Betis", league).unwrap();
        cold.resolve_player(&conn, "Ana", "es ESP", "FW").unwrap();
        assert_eq!(cold.leagues_created, 0);
        assert_eq!(cold.teams_created, 1);
        assert_eq!(cold.players_created, 0);
    }

    #[test]
    fn player_position_refreshes_on_conflict() {
        let conn = test_conn();
        let mut cache = DimensionCache::default();
        cache.resolve_player(&conn, "Leo", "ar ARG", "MF").unwrap();

        let mut rerun = DimensionCache::default();
        let id = rerun.resolve_player(&conn, "Leo", "ar ARG", "FW").unwrap();
        let pos: Option<String> = conn
            .query_row(
                "SELECT primary_position FROM players WHERE player_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(pos.as_deref(), Some("FW"));
    }

    #[test]
    fn unchanged_position_skips_the_write() {
        let conn = test_conn();
        let mut cache = DimensionCache::default();
        let id = cache.resolve_player(&conn, "Leo", "ar ARG", "MF").unwrap();

        // An out-of-band edit survives a repeat sighting of the same role,
        // because the cache knows "MF" was already written.
        conn.execute(
            "UPDATE players SET primary_position = 'DF' WHERE player_id = ?1",
            params![id],
        )
        .unwrap();
        cache.resolve_player(&conn, "Leo", "ar ARG", "MF").unwrap();
        let pos: Option<String> = conn
            .query_row(
                "SELECT primary_position FROM players WHERE player_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(pos.as_deref(), Some("DF"));

        // A different role still wins.
        cache.resolve_player(&conn, "Leo", "ar ARG", "FW").unwrap();
        let pos: Option<String> = conn
            .query_row(
                "SELECT primary_position FROM players WHERE player_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(pos.as_deref(), Some("FW"));
    }
}
