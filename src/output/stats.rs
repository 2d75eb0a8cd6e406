//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::records::{is_present, Record};
use crate::state::CoordinatorState;
use crate::storage::{RunRecord, Store};
use crate::HarvestError;

/// How many past runs are summarised
const RECENT_RUNS: usize = 5;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of collected records
    pub total_records: usize,

    /// Records carrying a real value, per optional field, in display order
    pub field_coverage: Vec<(&'static str, usize)>,

    /// Last persisted coordinator checkpoint
    pub last_state: Option<CoordinatorState>,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(store: &dyn Store) -> Result<HarvestStatistics, HarvestError> {
    let records = store.load_records()?;
    let last_state = store.load_state()?;
    let recent_runs = store.recent_runs(RECENT_RUNS)?;

    Ok(HarvestStatistics {
        total_records: records.len(),
        field_coverage: field_coverage(&records),
        last_state,
        recent_runs,
    })
}

fn field_coverage(records: &[Record]) -> Vec<(&'static str, usize)> {
    let fields: [(&'static str, fn(&Record) -> &str); 4] = [
        ("website", |r| r.website.as_str()),
        ("industry", |r| r.industry.as_str()),
        ("phone", |r| r.phone.as_str()),
        ("headquarters", |r| r.headquarters.as_str()),
    ];

    fields
        .iter()
        .map(|(label, field)| {
            let count = records.iter().filter(|r| is_present(field(r))).count();
            (*label, count)
        })
        .collect()
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Records:");
    println!("  Total collected: {}", stats.total_records);
    for (label, count) in &stats.field_coverage {
        let percentage = if stats.total_records > 0 {
            (*count as f64 / stats.total_records as f64) * 100.0
        } else {
            0.0
        };
        println!("  With {}: {} ({:.1}%)", label, count, percentage);
    }
    println!();

    if let Some(state) = &stats.last_state {
        println!("Last Checkpoint:");
        println!("  Phase: {}", state.phase);
        println!(
            "  Pages: {} to {} (budget {})",
            state.start_page, state.current_page, state.max_pages
        );
        println!(
            "  Items: {} found, {} processed",
            state.total_found_count, state.processed_count
        );
        println!("  Updated: {}", state.last_updated.to_rfc3339());
        if !state.errors.is_empty() {
            println!("  Errors ({}):", state.errors.len());
            for error in state.errors.iter().rev().take(5) {
                println!("    - {}", error);
            }
        }
        println!();
    }

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            println!(
                "  #{} {} [{}] pages {}..+{}: {} found, {} processed, {} errors",
                run.id,
                run.started_at,
                run.status.to_db_string(),
                run.start_page,
                run.stats.pages_reached,
                run.stats.items_found,
                run.stats.items_processed,
                run.stats.error_count
            );
        }
        println!();
    }
}
