use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Listing-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub limiter: LimiterConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    pub output: OutputConfig,
}

/// Describes the site being harvested and its URL scheme
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Registrable domain of the site (e.g., "linkedin.com")
    pub domain: String,

    /// First path segment of detail pages (e.g., "company")
    #[serde(rename = "entity-path")]
    pub entity_path: String,

    /// Sub-page opened for extraction (e.g., "about")
    #[serde(rename = "detail-subpath", default)]
    pub detail_subpath: Option<String>,

    /// Path prefix identifying listing pages (e.g., "search/results/companies")
    #[serde(rename = "listing-path")]
    pub listing_path: String,
}

/// Rate limiter tuning, all values in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct LimiterConfig {
    #[serde(rename = "min-delay-ms", default = "default_min_delay")]
    pub min_delay_ms: u64,

    #[serde(rename = "max-delay-ms", default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Wait applied when the sampled delay has already elapsed since the last request
    #[serde(rename = "min-floor-ms", default = "default_min_floor")]
    pub min_floor_ms: u64,

    /// How long the limiter stays engaged after the site pushes back
    #[serde(rename = "throttle-ms", default = "default_throttle")]
    pub throttle_ms: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
            min_floor_ms: default_min_floor(),
            throttle_ms: default_throttle(),
        }
    }
}

/// Coordinator step bounds and retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(rename = "default-max-pages", default = "default_max_pages")]
    pub default_max_pages: u32,

    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    #[serde(rename = "content-timeout-ms", default = "default_content_timeout")]
    pub content_timeout_ms: u64,

    #[serde(rename = "tab-load-timeout-ms", default = "default_tab_load_timeout")]
    pub tab_load_timeout_ms: u64,

    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl CoordinatorConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_millis(self.content_timeout_ms)
    }

    pub fn tab_load_timeout(&self) -> Duration {
        Duration::from_millis(self.tab_load_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_max_pages: default_max_pages(),
            navigation_timeout_ms: default_navigation_timeout(),
            content_timeout_ms: default_content_timeout(),
            tab_load_timeout_ms: default_tab_load_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

/// How the browser is obtained
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub headless: bool,

    /// DevTools websocket of an already running, logged-in browser
    #[serde(rename = "debugger-url", default)]
    pub debugger_url: Option<String>,

    /// Profile directory used when launching a new browser
    #[serde(rename = "user-data-dir", default)]
    pub user_data_dir: Option<String>,

    /// Listing page opened at start when no listing tab is supplied
    #[serde(rename = "listing-url", default)]
    pub listing_url: Option<String>,

    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_min_delay() -> u64 {
    5_000
}

fn default_max_delay() -> u64 {
    10_000
}

fn default_min_floor() -> u64 {
    2_000
}

fn default_throttle() -> u64 {
    60_000
}

fn default_max_pages() -> u32 {
    5
}

fn default_navigation_timeout() -> u64 {
    10_000
}

fn default_content_timeout() -> u64 {
    8_000
}

fn default_tab_load_timeout() -> u64 {
    15_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    500
}
