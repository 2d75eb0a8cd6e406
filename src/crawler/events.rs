//! The coordinator's command and notification protocol

use crate::records::Record;
use crate::state::{CoordinatorState, RunStats};
use serde::{Deserialize, Serialize};

/// Notifications emitted to observers
///
/// Delivery is fire-and-forget; a lagging or absent observer never blocks the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CoordinatorEvent {
    Started,
    StatusUpdate {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ItemsFoundOnPage {
        count: u32,
        page_number: u32,
    },
    #[serde(rename_all = "camelCase")]
    ItemProcessed {
        record: Record,
        processed_count: u32,
        skipped: bool,
    },
    Completed {
        stats: RunStats,
    },
    Stopped {
        stats: RunStats,
    },
    Paused,
    Resumed,
}

impl CoordinatorEvent {
    pub fn status(text: impl Into<String>) -> Self {
        Self::StatusUpdate { text: text.into() }
    }

    /// Returns true for the two notifications that end a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Stopped { .. })
    }
}

/// Commands accepted from the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    Start {
        max_pages: u32,
    },
    Stop,
    Pause,
    Resume,
    GetState,
    GetRecords,
    ClearAll,
    ReplaceRecords {
        records: Vec<Record>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::GetState => "getState",
            Self::GetRecords => "getRecords",
            Self::ClearAll => "clearAll",
            Self::ReplaceRecords { .. } => "replaceRecords",
        }
    }
}

/// Successful answers to a [`Command`]
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ack,
    State(Box<CoordinatorState>),
    Records(Vec<Record>),
    Stats(RunStats),
}

/// Run-control signal observed by the drive loop at each suspension point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Run,
    Pause,
    Stop,
}
