//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::records::Record;
use crate::state::{CoordinatorState, RunStats};
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error for key '{key}': {source}")]
    Serialization {
        key: String,
        source: serde_json::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home of the record collection, the coordinator checkpoint and run history
///
/// Each write is atomic per key with last-write-wins semantics; there is only ever one
/// active writer, so no cross-key transactions are required.
pub trait Store: Send {
    // ===== Record Collection =====

    /// Loads the whole record collection, in insertion order
    fn load_records(&self) -> StorageResult<Vec<Record>>;

    /// Replaces the whole record collection
    fn replace_records(&mut self, records: &[Record]) -> StorageResult<()>;

    /// Appends one record to the collection in a single atomic step
    ///
    /// The caller is responsible for having checked it is not a duplicate.
    fn append_record(&mut self, record: &Record) -> StorageResult<()>;

    /// Number of records in the collection
    fn count_records(&self) -> StorageResult<usize> {
        Ok(self.load_records()?.len())
    }

    // ===== Coordinator Checkpoint =====

    /// Loads the last persisted coordinator state, if any
    fn load_state(&self) -> StorageResult<Option<CoordinatorState>>;

    /// Persists the coordinator state
    fn save_state(&mut self, state: &CoordinatorState) -> StorageResult<()>;

    /// Removes the record collection and the coordinator checkpoint
    fn clear_all(&mut self) -> StorageResult<()>;

    // ===== Run History =====

    /// Records the start of a run and returns its ID
    fn begin_run(&mut self, start_page: u32, max_pages: u32, config_hash: &str)
        -> StorageResult<i64>;

    /// Records how a run ended
    fn finish_run(&mut self, run_id: i64, status: RunStatus, stats: &RunStats)
        -> StorageResult<()>;

    /// Marks every run still recorded as running as interrupted
    ///
    /// Returns the number of runs changed.
    fn interrupt_stale_runs(&mut self) -> StorageResult<usize>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent runs, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;
}
