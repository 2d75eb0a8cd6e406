//! State module for tracking run progress
//!
//! # Components
//!
//! - `RunPhase`: the coordinator's lifecycle phase and its legal transitions
//! - `CoordinatorState`: the checkpointed counters, queue and error log of a run
//! - `RunStats`: the figures reported when a run ends

mod run_phase;
mod run_state;

// Re-export main types
pub use run_phase::RunPhase;
pub use run_state::{CoordinatorState, RunStats};
