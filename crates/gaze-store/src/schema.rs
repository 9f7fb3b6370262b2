use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS dwell_stats (
            media_id   TEXT PRIMARY KEY,
            title      TEXT NOT NULL DEFAULT '',
            dwell_secs INTEGER NOT NULL DEFAULT 0,
            commits    INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS commits (
            id           TEXT PRIMARY KEY,
            media_id     TEXT NOT NULL,
            title        TEXT NOT NULL DEFAULT '',
            watch_url    TEXT NOT NULL,
            committed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_commits_media ON commits(media_id);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
