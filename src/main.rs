//! Listing-Harvest main entry point
//!
//! This is the command-line interface for the Listing-Harvest collector.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use listing_harvest::browser::{BrowserSession, ChromeDetails, ChromeListing};
use listing_harvest::config::{load_config_with_hash, Config};
use listing_harvest::crawler::{merge_import, Coordinator, CoordinatorEvent, CoordinatorOptions};
use listing_harvest::dedup::DuplicateMatcher;
use listing_harvest::output::{load_statistics, print_records, print_statistics, records_to_json};
use listing_harvest::storage::{open_storage, SqliteStore, Store};
use listing_harvest::url::TargetSite;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

/// Listing-Harvest: a polite collector for paginated entity listings
///
/// Listing-Harvest drives a signed-in browser through search results, visits
/// each entity's detail page behind a randomized rate limiter and keeps a
/// de-duplicated record collection in a local database.
#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite collector for paginated entity listings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Harvest from the listing tab; type pause, resume or stop while it runs
    Run {
        /// Listing pages to cover, including the current one
        #[arg(long)]
        pages: Option<u32>,

        /// Listing page to open when no tab already shows one
        #[arg(long)]
        listing_url: Option<String>,
    },

    /// Merge records from a JSON file, skipping duplicates
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show collected records
    Records {
        /// Print as JSON in the shape `import` accepts
        #[arg(long)]
        json: bool,
    },

    /// Show the last persisted checkpoint
    State,

    /// Show statistics from the database
    Stats,

    /// Delete all records and the checkpoint
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Commands::Run { pages, listing_url } => {
            handle_run(&config, &config_hash, pages, listing_url).await?
        }
        Commands::Import { file } => handle_import(&config, &file)?,
        Commands::Records { json } => handle_records(&config, json)?,
        Commands::State => handle_state(&config)?,
        Commands::Stats => handle_stats(&config)?,
        Commands::Clear { yes } => handle_clear(&config, yes)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvest=info,warn"),
            1 => EnvFilter::new("listing_harvest=debug,info"),
            2 => EnvFilter::new("listing_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    let path = Path::new(&config.output.database_path);
    open_storage(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles the run command: harvests until the budget, the last page or a stop
async fn handle_run(
    config: &Config,
    config_hash: &str,
    pages: Option<u32>,
    listing_url: Option<String>,
) -> anyhow::Result<()> {
    let max_pages = pages.unwrap_or(config.coordinator.default_max_pages);
    let site = TargetSite::from_config(&config.target);
    let store = open_store(config)?;

    let session = BrowserSession::open(&config.browser).await?;
    let listing_url = listing_url.or_else(|| config.browser.listing_url.clone());
    let page = match session.listing_tab(&site, listing_url.as_deref()).await {
        Ok(page) => page,
        Err(e) => {
            session.shutdown().await;
            return Err(e.into());
        }
    };

    let navigator = Arc::new(ChromeListing::new(page, site));
    let details = Arc::new(ChromeDetails::new(
        session.browser(),
        config.browser.user_agent.clone(),
    ));
    let coordinator = Coordinator::new(
        CoordinatorOptions::from_config(config, config_hash),
        Box::new(store),
        navigator,
        details,
    )?;

    let mut events = coordinator.subscribe();
    if let Err(e) = coordinator.start(max_pages).await {
        tracing::error!("Run did not start: {}", e);
        drop(coordinator);
        session.shutdown().await;
        return Err(e.into());
    }

    let controls = tokio::spawn(control_loop(Arc::clone(&coordinator)));

    loop {
        match events.recv().await {
            Ok(event) => {
                log_event(&event);
                if event.is_terminal() {
                    break;
                }
            }
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!("Skipped {} notification(s)", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }

    controls.abort();
    let stats = coordinator.wait().await;

    println!("\n=== Run Summary ===");
    println!("  Pages reached: {}", stats.pages_reached);
    println!("  Items found: {}", stats.items_found);
    println!("  Items processed: {}", stats.items_processed);
    println!("  Errors: {}", stats.error_count);

    drop(coordinator);
    session.shutdown().await;
    Ok(())
}

/// Reads pause, resume and stop from stdin; an interrupt also stops the run
async fn control_loop(coordinator: Arc<Coordinator>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) | Err(_) => {
                        stdin_open = false;
                        continue;
                    }
                };

                let result = match line.trim() {
                    "" => Ok(()),
                    "pause" => coordinator.pause(),
                    "resume" => coordinator.resume(),
                    "stop" => coordinator.stop().await.map(|_| ()),
                    other => {
                        tracing::warn!("Unknown command '{}'; use pause, resume or stop", other);
                        Ok(())
                    }
                };
                if let Err(e) = result {
                    tracing::warn!("{}", e);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    tracing::info!("Interrupt received, stopping after the current step");
                }
                if let Err(e) = coordinator.stop().await {
                    tracing::warn!("{}", e);
                }
                return;
            }
        }
    }
}

fn log_event(event: &CoordinatorEvent) {
    match event {
        CoordinatorEvent::Started => tracing::info!("Run started"),
        CoordinatorEvent::StatusUpdate { text } => tracing::debug!("{}", text),
        CoordinatorEvent::ItemsFoundOnPage { count, page_number } => {
            tracing::info!("Page {}: {} item(s) found", page_number, count)
        }
        CoordinatorEvent::ItemProcessed {
            record,
            processed_count,
            skipped,
        } => {
            if *skipped {
                tracing::info!("Skipped duplicate {}", record.name);
            } else {
                tracing::info!("[{}] Saved {}", processed_count, record.name);
            }
        }
        CoordinatorEvent::Paused => tracing::info!("Paused; type resume to continue"),
        CoordinatorEvent::Resumed => tracing::info!("Resumed"),
        CoordinatorEvent::Completed { .. } => tracing::info!("Run completed"),
        CoordinatorEvent::Stopped { .. } => tracing::info!("Run stopped"),
    }
}

/// Handles the import command: merges a JSON export into the collection
fn handle_import(config: &Config, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mut store = open_store(config)?;
    let matcher = DuplicateMatcher::new(TargetSite::from_config(&config.target));
    let summary = merge_import(&mut store, &matcher, &content)?;

    println!(
        "✓ Imported {} record(s) ({} duplicate(s) skipped, {} rejected)",
        summary.added, summary.duplicates, summary.rejected
    );
    Ok(())
}

/// Handles the records command
fn handle_records(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let records = store.load_records()?;

    if json {
        println!("{}", records_to_json(&records)?);
    } else {
        print_records(&records);
    }
    Ok(())
}

/// Handles the state command
fn handle_state(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    match store.load_state()? {
        Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        None => println!("No checkpoint saved yet."),
    }
    Ok(())
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(config)?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the clear command
fn handle_clear(config: &Config, yes: bool) -> anyhow::Result<()> {
    if !yes {
        bail!("Refusing to delete collected records without --yes");
    }

    let mut store = open_store(config)?;
    if store.load_state()?.is_some_and(|state| state.is_running) {
        tracing::warn!("The checkpoint describes an unfinished run; clearing it as well");
    }
    store.clear_all()?;

    println!("✓ Records and checkpoint deleted");
    Ok(())
}
