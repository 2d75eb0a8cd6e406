//! Configuration module for Listing-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use listing_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting from: {}", config.target.domain);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CoordinatorConfig, LimiterConfig, OutputConfig, TargetConfig,
};

// Re-export parser functions
pub use parser::{load_config, load_config_with_hash};
pub use validation::MAX_PAGE_BUDGET;
