//! Listing-Harvest: a resumable, polite collector for paginated entity listings
//!
//! This crate drives an authenticated browser through a search-result listing, visits each
//! linked detail page one at a time, extracts structured fields with best-effort heuristics,
//! de-duplicates against everything collected so far and persists results locally.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod dedup;
pub mod output;
pub mod records;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Listing-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Import error: {0}")]
    Import(#[from] records::ImportError),

    #[error("Page context not ready: {0}")]
    Transient(String),

    #[error("Navigation did not settle: {0}")]
    Navigation(String),

    #[error("Extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("Target site is rate limiting: {0}")]
    RateLimited(String),

    #[error("Not positioned on a listing page: {0}")]
    Setup(String),

    #[error("Listing context lost: {0}")]
    Fatal(String),

    #[error("Command '{command}' is not valid while {phase}")]
    InvalidCommand {
        command: &'static str,
        phase: state::RunPhase,
    },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunPhase,
        to: state::RunPhase,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Operation cancelled by stop request")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl HarvestError {
    /// Returns true for failures worth retrying after a short backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Returns true for failures that end the current run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Fatal(_) | Self::StorageError(_) | Self::Database(_) | Self::Storage(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Listing-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CoordinatorEvent, RateLimiter, RunStats};
pub use dedup::{normalize_name, DuplicateMatcher};
pub use records::{Record, NOT_FOUND};
pub use state::{CoordinatorState, RunPhase};
pub use url::TargetSite;
