//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::records::Record;
use crate::state::{CoordinatorState, RunStats};
use crate::storage::schema::{initialize_schema, RECORDS_KEY, STATE_KEY};
use crate::storage::traits::{StorageError, StorageResult, Store};
use crate::storage::{RunRecord, RunStatus};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, start_page, \
     max_pages, pages_reached, items_found, items_processed, error_count";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn get_value<T: DeserializeOwned>(conn: &Connection, key: &str) -> StorageResult<Option<T>> {
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|source| StorageError::Serialization {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn set_value<T: Serialize + ?Sized>(
        conn: &Connection,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })?;

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Interrupted),
        start_page: row.get(5)?,
        max_pages: row.get(6)?,
        stats: RunStats {
            pages_reached: row.get(7)?,
            items_found: row.get(8)?,
            items_processed: row.get(9)?,
            error_count: row.get(10)?,
        },
    })
}

impl Store for SqliteStore {
    // ===== Record Collection =====

    fn load_records(&self) -> StorageResult<Vec<Record>> {
        Ok(Self::get_value(&self.conn, RECORDS_KEY)?.unwrap_or_default())
    }

    fn replace_records(&mut self, records: &[Record]) -> StorageResult<()> {
        Self::set_value(&self.conn, RECORDS_KEY, records)
    }

    fn append_record(&mut self, record: &Record) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        let mut records: Vec<Record> = Self::get_value(&tx, RECORDS_KEY)?.unwrap_or_default();
        records.push(record.clone());
        Self::set_value(&tx, RECORDS_KEY, &records)?;
        tx.commit()?;
        Ok(())
    }

    // ===== Coordinator Checkpoint =====

    fn load_state(&self) -> StorageResult<Option<CoordinatorState>> {
        Self::get_value(&self.conn, STATE_KEY)
    }

    fn save_state(&mut self, state: &CoordinatorState) -> StorageResult<()> {
        Self::set_value(&self.conn, STATE_KEY, state)
    }

    fn clear_all(&mut self) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM kv_store WHERE key IN (?1, ?2)",
            params![RECORDS_KEY, STATE_KEY],
        )?;
        Ok(())
    }

    // ===== Run History =====

    fn begin_run(
        &mut self,
        start_page: u32,
        max_pages: u32,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status, start_page, max_pages)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                now,
                config_hash,
                RunStatus::Running.to_db_string(),
                start_page,
                max_pages
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus, stats: &RunStats) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET finished_at = ?1, status = ?2, pages_reached = ?3,
                 items_found = ?4, items_processed = ?5, error_count = ?6
             WHERE id = ?7",
            params![
                now,
                status.to_db_string(),
                stats.pages_reached,
                stats.items_found,
                stats.items_processed,
                stats.error_count,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn interrupt_stale_runs(&mut self) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE status = ?3",
            params![
                RunStatus::Interrupted.to_db_string(),
                now,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(changed)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT ?1", RUN_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}
