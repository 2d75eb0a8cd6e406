//! Output module for presenting harvest results
//!
//! This module handles:
//! - Listing collected records as a table or JSON
//! - Recording and displaying harvest statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};

use crate::records::Record;
use crate::HarvestError;

/// Longest value shown in a table cell before it is cut
const CELL_WIDTH: usize = 32;

/// Prints records as an aligned text table
pub fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("No records collected yet.");
        return;
    }

    println!(
        "{:<32}  {:<32}  {:<24}  {:<18}  {:<24}",
        "NAME", "WEBSITE", "INDUSTRY", "PHONE", "HEADQUARTERS"
    );
    for record in records {
        println!(
            "{:<32}  {:<32}  {:<24}  {:<18}  {:<24}",
            cell(&record.name),
            cell(&record.website),
            cell(&record.industry),
            cell(&record.phone),
            cell(&record.headquarters)
        );
    }
    println!("\n{} record(s)", records.len());
}

/// Serializes records in the same shape the import command accepts
pub fn records_to_json(records: &[Record]) -> Result<String, HarvestError> {
    Ok(serde_json::to_string_pretty(&serde_json::json!({ "records": records }))?)
}

fn cell(value: &str) -> String {
    if value.chars().count() <= CELL_WIDTH {
        value.to_string()
    } else {
        let cut: String = value.chars().take(CELL_WIDTH - 1).collect();
        format!("{}…", cut)
    }
}
