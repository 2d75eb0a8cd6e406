use crate::records::ItemLink;
use crate::state::RunPhase;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Checkpointed machine state of the coordinator
///
/// Owned and mutated only by the coordinator; observers receive clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorState {
    pub phase: RunPhase,
    pub is_running: bool,
    pub is_paused: bool,
    /// Listing page the run began on
    pub start_page: u32,
    pub current_page: u32,
    /// Budget of listing pages to traverse
    pub max_pages: u32,
    pub processed_count: u32,
    pub total_found_count: u32,
    /// Not-yet-visited items of the current page
    pub pending_queue: Vec<ItemLink>,
    pub queue_cursor: usize,
    pub errors: Vec<String>,
    /// Row in the run history table, if the run was recorded
    #[serde(default)]
    pub run_id: Option<i64>,
    pub last_updated: DateTime<Utc>,
}

/// Summary figures reported when a run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub pages_reached: u32,
    pub items_found: u32,
    pub items_processed: u32,
    pub error_count: u32,
}

impl CoordinatorState {
    /// Creates an idle state with no history
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            is_running: false,
            is_paused: false,
            start_page: 1,
            current_page: 1,
            max_pages: 1,
            processed_count: 0,
            total_found_count: 0,
            pending_queue: Vec::new(),
            queue_cursor: 0,
            errors: Vec::new(),
            run_id: None,
            last_updated: Utc::now(),
        }
    }

    /// Resets counters for a fresh run beginning on `start_page`
    pub fn begin_run(&mut self, start_page: u32, max_pages: u32) -> Result<(), HarvestError> {
        self.transition(RunPhase::Running)?;
        self.start_page = start_page;
        self.current_page = start_page;
        self.max_pages = max_pages;
        self.processed_count = 0;
        self.total_found_count = 0;
        self.pending_queue.clear();
        self.queue_cursor = 0;
        self.errors.clear();
        self.run_id = None;
        Ok(())
    }

    /// Moves to `next`, keeping the running/paused flags consistent with the phase
    pub fn transition(&mut self, next: RunPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        self.phase = next;
        self.is_running = next.is_active();
        self.is_paused = next == RunPhase::Paused;
        self.touch();
        Ok(())
    }

    /// Marks a checkpoint left behind by a process that died mid-run
    ///
    /// Returns true if the state had to be changed.
    pub fn mark_interrupted(&mut self) -> bool {
        if self.phase == RunPhase::Idle && !self.is_running {
            return false;
        }

        self.phase = RunPhase::Idle;
        self.is_running = false;
        self.is_paused = false;
        self.errors
            .push("Run interrupted: process exited before completion".to_string());
        self.touch();
        true
    }

    /// Installs the queue for the current page
    pub fn set_queue(&mut self, queue: Vec<ItemLink>) {
        self.pending_queue = queue;
        self.queue_cursor = 0;
        self.touch();
    }

    /// The next unvisited item, if any
    pub fn next_item(&self) -> Option<&ItemLink> {
        self.pending_queue.get(self.queue_cursor)
    }

    pub fn advance_cursor(&mut self) {
        self.queue_cursor = (self.queue_cursor + 1).min(self.pending_queue.len());
        self.touch();
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.touch();
    }

    /// Number of listing pages reached so far in this run
    pub fn pages_reached(&self) -> u32 {
        self.current_page.saturating_sub(self.start_page) + 1
    }

    /// Returns true if another listing page fits in the budget
    pub fn has_page_budget(&self) -> bool {
        self.pages_reached() < self.max_pages
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            pages_reached: self.pages_reached(),
            items_found: self.total_found_count,
            items_processed: self.processed_count,
            error_count: self.errors.len() as u32,
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

impl Default for CoordinatorState {
    fn default() -> Self {
        Self::new()
    }
}
