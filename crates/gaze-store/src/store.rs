use std::fs;
use std::path::Path;

use gaze_core::ContentItem;
use rusqlite::{Connection, params};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::schema;

/// Database file name inside the base directory.
pub const STATS_DB: &str = "stats.db";

/// Per-media totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DwellStat {
    pub media_id: String,
    pub title: String,
    pub dwell_secs: u64,
    pub commits: u64,
}

/// One row of the selection history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub id: Uuid,
    pub media_id: String,
    pub title: String,
    pub watch_url: String,
    /// ISO-8601 UTC.
    pub committed_at: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Open `<base>/stats.db`, creating `base` if needed.
    pub fn open_in_dir(base: &Path) -> Result<Self> {
        fs::create_dir_all(base)?;
        let path = base.join(STATS_DB);
        tracing::debug!("opening stats database at {}", path.display());
        Self::open(&path)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Writes ---

    /// Add `secs` of observed dwell to the item's running total.
    pub fn record_dwell_secs(&self, item: &ContentItem, secs: u64) -> Result<()> {
        if secs == 0 {
            return Ok(());
        }
        self.conn.execute(
            "INSERT INTO dwell_stats (media_id, title, dwell_secs) VALUES (?1, ?2, ?3)
             ON CONFLICT(media_id) DO UPDATE SET
                 title = excluded.title,
                 dwell_secs = dwell_secs + excluded.dwell_secs",
            params![item.media_id, item.title, to_sql_count(secs)?],
        )?;
        Ok(())
    }

    /// Append a committed selection to the history and bump its counter.
    pub fn record_commit(&self, item: &ContentItem) -> Result<Uuid> {
        if !item.has_media() {
            return Err(StoreError::InvalidData(format!(
                "cannot record commit of '{}' without a media id",
                item.title
            )));
        }
        let id = Uuid::new_v4();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO commits (id, media_id, title, watch_url) VALUES (?1, ?2, ?3, ?4)",
            params![id.to_string(), item.media_id, item.title, item.watch_url()],
        )?;
        tx.execute(
            "INSERT INTO dwell_stats (media_id, title, commits) VALUES (?1, ?2, 1)
             ON CONFLICT(media_id) DO UPDATE SET
                 title = excluded.title,
                 commits = commits + 1",
            params![item.media_id, item.title],
        )?;
        tx.commit()?;
        tracing::debug!("recorded commit {id} for {}", item.media_id);
        Ok(id)
    }

    // --- Reads ---

    /// All per-media totals, most watched first.
    pub fn stats(&self) -> Result<Vec<DwellStat>> {
        let mut stmt = self.conn.prepare(
            "SELECT media_id, title, dwell_secs, commits FROM dwell_stats
             ORDER BY dwell_secs DESC, commits DESC, media_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DwellStat {
                    media_id: row.get(0)?,
                    title: row.get(1)?,
                    dwell_secs: row.get::<_, i64>(2)?.max(0) as u64,
                    commits: row.get::<_, i64>(3)?.max(0) as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Newest commits first.
    pub fn recent_commits(&self, limit: usize) -> Result<Vec<CommitRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, media_id, title, watch_url, committed_at FROM commits
             ORDER BY rowid DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([to_sql_count(limit as u64)?], |row| {
                let id: String = row.get(0)?;
                Ok((id, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<std::result::Result<Vec<(String, String, String, String, String)>, _>>()?;

        rows.into_iter()
            .map(|(id, media_id, title, watch_url, committed_at)| {
                let id = Uuid::parse_str(&id)
                    .map_err(|e| StoreError::InvalidData(format!("bad commit id {id}: {e}")))?;
                Ok(CommitRecord {
                    id,
                    media_id,
                    title,
                    watch_url,
                    committed_at,
                })
            })
            .collect()
    }

    pub fn commit_count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM commits", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}

fn to_sql_count(n: u64) -> Result<i64> {
    i64::try_from(n).map_err(|_| StoreError::InvalidData(format!("count {n} out of range")))
}
