//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Listing-Harvest database.

/// Key under which the record collection is stored
pub const RECORDS_KEY: &str = "records";

/// Key under which the coordinator checkpoint is stored
pub const STATE_KEY: &str = "coordinator_state";

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Key-value persistence for the record collection and the coordinator checkpoint
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    start_page INTEGER NOT NULL,
    max_pages INTEGER NOT NULL,
    pages_reached INTEGER NOT NULL DEFAULT 0,
    items_found INTEGER NOT NULL DEFAULT 0,
    items_processed INTEGER NOT NULL DEFAULT 0,
    error_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_runs_status ON runs(status);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
