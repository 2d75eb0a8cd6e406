//! Scripted collaborators shared by the integration tests

use async_trait::async_trait;
use chrono::Utc;
use listing_harvest::config::{CoordinatorConfig, LimiterConfig};
use listing_harvest::crawler::{
    Coordinator, CoordinatorEvent, CoordinatorOptions, DetailBrowser, DetailTab, ListingNavigator,
};
use listing_harvest::records::{DetailFields, ItemLink, Record, NOT_FOUND};
use listing_harvest::storage::{SqliteStore, Store};
use listing_harvest::url::TargetSite;
use listing_harvest::{HarvestError, Result};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{broadcast, mpsc, Semaphore};

pub const LISTING: &str = "https://www.linkedin.com/search/results/companies/?keywords=robots";

pub fn company_url(slug: &str) -> String {
    format!("https://www.linkedin.com/company/{}/", slug)
}

pub fn link(slug: &str, name: &str) -> ItemLink {
    ItemLink::new(&company_url(slug), Some(name))
}

/// A record as it would have been stored by an earlier run
pub fn stored(name: &str, slug: &str) -> Record {
    Record {
        name: name.to_string(),
        website: NOT_FOUND.to_string(),
        industry: NOT_FOUND.to_string(),
        phone: NOT_FOUND.to_string(),
        headquarters: NOT_FOUND.to_string(),
        url: company_url(slug),
        timestamp: Utc::now(),
    }
}

/// Options with no pacing delays and short timeouts
pub fn fast_options() -> CoordinatorOptions {
    CoordinatorOptions {
        site: TargetSite::default(),
        limiter: LimiterConfig {
            min_delay_ms: 0,
            max_delay_ms: 0,
            min_floor_ms: 0,
            throttle_ms: 0,
        },
        settings: CoordinatorConfig {
            default_max_pages: 3,
            navigation_timeout_ms: 200,
            content_timeout_ms: 200,
            tab_load_timeout_ms: 200,
            retry_attempts: 2,
            retry_backoff_ms: 1,
        },
        config_hash: "test-config".to_string(),
    }
}

/// A database file in a temporary directory that outlives individual connections
pub struct TestDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("harvest.db");
        Self { _dir: dir, path }
    }

    pub fn open(&self) -> SqliteStore {
        SqliteStore::new(&self.path).unwrap()
    }

    pub fn seed(&self, records: &[Record]) {
        self.open().replace_records(records).unwrap();
    }
}

/// What happens to the listing tab once its first page has been read
#[derive(Clone)]
pub enum AfterRead {
    /// The tab navigates to another URL
    Strays(String),
    /// The tab stops answering
    Unreachable,
}

/// A listing whose pages are scripted up front
///
/// Advancing succeeds until the last scripted page, after which it reports no next page.
pub struct FakeNavigator {
    url: Mutex<String>,
    pages: Vec<Vec<ItemLink>>,
    current: Mutex<usize>,
    advances: AtomicUsize,
    read: AtomicBool,
    after_read: Option<AfterRead>,
    advance_error: Option<String>,
    flaky_reads: AtomicUsize,
}

impl FakeNavigator {
    pub fn new(pages: Vec<Vec<ItemLink>>) -> Self {
        Self::at(LISTING, pages)
    }

    pub fn at(url: &str, pages: Vec<Vec<ItemLink>>) -> Self {
        Self {
            url: Mutex::new(url.to_string()),
            pages,
            current: Mutex::new(0),
            advances: AtomicUsize::new(0),
            read: AtomicBool::new(false),
            after_read: None,
            advance_error: None,
            flaky_reads: AtomicUsize::new(0),
        }
    }

    pub fn after_read(mut self, change: AfterRead) -> Self {
        self.after_read = Some(change);
        self
    }

    /// Every attempt to advance fails with a browser error
    pub fn advance_fails(mut self, message: &str) -> Self {
        self.advance_error = Some(message.to_string());
        self
    }

    /// The first `failures` item enumerations fail transiently
    pub fn flaky(self, failures: usize) -> Self {
        self.flaky_reads.store(failures, Ordering::SeqCst);
        self
    }

    pub fn advances(&self) -> usize {
        self.advances.load(Ordering::SeqCst)
    }

    pub fn url(&self) -> String {
        self.url.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingNavigator for FakeNavigator {
    async fn current_url(&self) -> Result<String> {
        if self.read.load(Ordering::SeqCst) {
            match &self.after_read {
                Some(AfterRead::Strays(url)) => return Ok(url.clone()),
                Some(AfterRead::Unreachable) => {
                    return Err(HarvestError::Browser("target closed".to_string()))
                }
                None => {}
            }
        }
        Ok(self.url())
    }

    async fn detect_page_number(&self) -> Result<Option<u32>> {
        Ok(None)
    }

    async fn extract_item_links(&self) -> Result<Vec<ItemLink>> {
        let flaky = self
            .flaky_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if flaky {
            return Err(HarvestError::Transient("results still rendering".to_string()));
        }

        self.read.store(true, Ordering::SeqCst);
        let current = *self.current.lock().unwrap();
        Ok(self.pages.get(current).cloned().unwrap_or_default())
    }

    async fn has_next_page(&self) -> Result<bool> {
        Ok(*self.current.lock().unwrap() + 1 < self.pages.len())
    }

    async fn advance_to_next_page(&self, _timeout: Duration) -> Result<bool> {
        self.advances.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.advance_error {
            return Err(HarvestError::Browser(message.clone()));
        }
        let mut current = self.current.lock().unwrap();
        if *current + 1 >= self.pages.len() {
            return Ok(false);
        }
        *current += 1;
        *self.url.lock().unwrap() = format!("{}&page={}", LISTING, *current + 1);
        Ok(true)
    }

    async fn wait_for_content(&self, _timeout: Duration) -> bool {
        true
    }
}

/// Detail tabs that answer with fields derived from the entity slug
pub struct FakeDetails {
    site: TargetSite,
    next_id: AtomicU64,
    open: Mutex<HashSet<u64>>,
    closed: AtomicUsize,
    opened: mpsc::UnboundedSender<String>,
    failing: HashSet<String>,
    rate_limited: HashSet<String>,
    flaky: Mutex<HashSet<String>>,
    names: HashMap<String, String>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeDetails {
    /// Returns the details browser and a receiver of every URL it opens
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (opened, visits) = mpsc::unbounded_channel();
        let details = Self {
            site: TargetSite::default(),
            next_id: AtomicU64::new(1),
            open: Mutex::new(HashSet::new()),
            closed: AtomicUsize::new(0),
            opened,
            failing: HashSet::new(),
            rate_limited: HashSet::new(),
            flaky: Mutex::new(HashSet::new()),
            names: HashMap::new(),
            gate: None,
        };
        (details, visits)
    }

    /// Page loads block until the returned semaphore hands out a permit
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Extraction for this slug fails
    pub fn failing(mut self, slug: &str) -> Self {
        self.failing.insert(slug.to_string());
        self
    }

    /// The detail page for this slug is a rate-limit wall
    pub fn rate_limited(mut self, slug: &str) -> Self {
        self.rate_limited.insert(slug.to_string());
        self
    }

    /// The first extraction for this slug fails transiently
    pub fn flaky(self, slug: &str) -> Self {
        self.flaky.lock().unwrap().insert(slug.to_string());
        self
    }

    /// The detail page for this slug shows a different name than the listing did
    pub fn named(mut self, slug: &str, name: &str) -> Self {
        self.names.insert(slug.to_string(), name.to_string());
        self
    }

    pub fn open_tabs(&self) -> usize {
        self.open.lock().unwrap().len()
    }

    pub fn closed_tabs(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn slug(&self, tab: &DetailTab) -> String {
        self.site.extract_slug(&tab.url).unwrap_or_default()
    }
}

#[async_trait]
impl DetailBrowser for FakeDetails {
    async fn open(&self, url: &str) -> Result<DetailTab> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.open.lock().unwrap().insert(id);
        let _ = self.opened.send(url.to_string());
        Ok(DetailTab {
            id,
            url: url.to_string(),
        })
    }

    async fn wait_loaded(&self, _tab: &DetailTab, _timeout: Duration) -> bool {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        true
    }

    async fn extract(&self, tab: &DetailTab) -> Result<DetailFields> {
        let slug = self.slug(tab);
        if self.failing.contains(&slug) {
            return Err(HarvestError::Browser("detail page crashed".to_string()));
        }
        if self.rate_limited.contains(&slug) {
            return Err(HarvestError::RateLimited(tab.url.clone()));
        }
        if self.flaky.lock().unwrap().remove(&slug) {
            return Err(HarvestError::Transient("execution context destroyed".to_string()));
        }

        let name = self
            .names
            .get(&slug)
            .cloned()
            .unwrap_or_else(|| format!("{} Robotics", slug));
        Ok(DetailFields {
            name: Some(name),
            website: Some(format!("https://{}.example", slug)),
            industry: Some("Automation".to_string()),
            ..DetailFields::default()
        })
    }

    async fn close(&self, tab: &DetailTab) -> Result<()> {
        if self.open.lock().unwrap().remove(&tab.id) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub fn coordinator(
    db: &TestDb,
    navigator: &Arc<FakeNavigator>,
    details: &Arc<FakeDetails>,
) -> Arc<Coordinator> {
    coordinator_with(fast_options(), db, navigator, details)
}

pub fn coordinator_with(
    options: CoordinatorOptions,
    db: &TestDb,
    navigator: &Arc<FakeNavigator>,
    details: &Arc<FakeDetails>,
) -> Arc<Coordinator> {
    Coordinator::new(
        options,
        Box::new(db.open()),
        Arc::clone(navigator) as Arc<dyn ListingNavigator>,
        Arc::clone(details) as Arc<dyn DetailBrowser>,
    )
    .unwrap()
}

/// Collects notifications up to and including the one that ends the run
pub async fn events_until_terminal(
    events: &mut broadcast::Receiver<CoordinatorEvent>,
) -> Vec<CoordinatorEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("run did not finish in time")
            .expect("event channel closed");
        let terminal = event.is_terminal();
        seen.push(event);
        if terminal {
            return seen;
        }
    }
}
