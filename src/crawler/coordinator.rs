//! Harvest coordinator - main run orchestration logic
//!
//! This module contains the state machine that ties the harvest together:
//! - Validating the listing tab and seeding the run's start page
//! - Pre-filtering each results page against the record store
//! - Visiting queued items one at a time behind the rate limiter
//! - Advancing the listing until the page budget or the last page is reached
//! - Pause, resume and stop at the loop's suspension points
//! - Persisting a checkpoint after every resumability-relevant change

use crate::config::{Config, CoordinatorConfig, LimiterConfig, MAX_PAGE_BUDGET};
use crate::crawler::events::Control;
use crate::crawler::{
    lock, with_retry, Command, CoordinatorEvent, DetailBrowser, DetailTab, ListingNavigator,
    RateLimiter, Reply, RetryPolicy,
};
use crate::dedup::DuplicateMatcher;
use crate::records::{parse_import, ItemLink, Record};
use crate::state::{CoordinatorState, RunPhase, RunStats};
use crate::storage::{RunStatus, StorageResult, Store};
use crate::url::{page_number_from_url, TargetSite};
use crate::{ConfigError, HarvestError, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Buffered notifications per observer before the slowest one starts lagging
const EVENT_CAPACITY: usize = 256;

/// Everything the coordinator needs besides its collaborators
#[derive(Debug, Clone, Default)]
pub struct CoordinatorOptions {
    pub site: TargetSite,
    pub limiter: LimiterConfig,
    pub settings: CoordinatorConfig,
    /// Recorded with each run in the history table
    pub config_hash: String,
}

impl CoordinatorOptions {
    pub fn from_config(config: &Config, config_hash: &str) -> Self {
        Self {
            site: TargetSite::from_config(&config.target),
            limiter: config.limiter.clone(),
            settings: config.coordinator.clone(),
            config_hash: config_hash.to_string(),
        }
    }
}

/// Outcome of merging an import batch into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub added: usize,
    pub duplicates: usize,
    /// Entries that were not record-shaped
    pub rejected: usize,
}

/// Merges a JSON import into `store`
///
/// Incoming records are de-duplicated against the collection and against each other, then
/// written back in a single replace.
pub fn merge_import(
    store: &mut dyn Store,
    matcher: &DuplicateMatcher,
    content: &str,
) -> Result<ImportSummary> {
    let batch = parse_import(content)?;

    let mut records = store.load_records()?;
    let (accepted, duplicates) = matcher.filter_new(batch.records, &records);
    let added = accepted.len();
    if added > 0 {
        records.extend(accepted);
        store.replace_records(&records)?;
    }

    tracing::info!(
        "Imported {} record(s), skipped {} duplicate(s), rejected {}",
        added,
        duplicates,
        batch.rejected
    );
    Ok(ImportSummary {
        added,
        duplicates,
        rejected: batch.rejected,
    })
}

/// The harvest state machine
///
/// Held behind an `Arc`: a started run executes on its own task and shares the coordinator with
/// the command surface. Item processing within a run is strictly sequential.
pub struct Coordinator {
    site: TargetSite,
    matcher: DuplicateMatcher,
    settings: CoordinatorConfig,
    retry: RetryPolicy,
    throttle: Duration,
    config_hash: String,
    navigator: Arc<dyn ListingNavigator>,
    details: Arc<dyn DetailBrowser>,
    limiter: RateLimiter,
    store: Mutex<Box<dyn Store>>,
    state: Mutex<CoordinatorState>,
    open_tab: Mutex<Option<DetailTab>>,
    control: watch::Sender<Control>,
    events: broadcast::Sender<CoordinatorEvent>,
    run: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Creates a coordinator over the given store and collaborators
    ///
    /// A checkpoint left behind by a process that died mid-run is marked interrupted; the run
    /// itself is not resumed.
    pub fn new(
        options: CoordinatorOptions,
        mut store: Box<dyn Store>,
        navigator: Arc<dyn ListingNavigator>,
        details: Arc<dyn DetailBrowser>,
    ) -> Result<Arc<Self>> {
        let mut state = store.load_state()?.unwrap_or_default();
        if state.mark_interrupted() {
            tracing::warn!(
                "Previous run stopped unexpectedly on page {}; a fresh start is required",
                state.current_page
            );
            store.save_state(&state)?;
        }

        let stale = store.interrupt_stale_runs()?;
        if stale > 0 {
            tracing::info!("Marked {} unfinished run(s) as interrupted", stale);
        }

        let (control, _) = watch::channel(Control::Run);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Arc::new(Self {
            matcher: DuplicateMatcher::new(options.site.clone()),
            site: options.site,
            retry: RetryPolicy::from_config(&options.settings),
            throttle: Duration::from_millis(options.limiter.throttle_ms),
            limiter: RateLimiter::from_config(&options.limiter),
            settings: options.settings,
            config_hash: options.config_hash,
            navigator,
            details,
            store: Mutex::new(store),
            state: Mutex::new(state),
            open_tab: Mutex::new(None),
            control,
            events,
            run: tokio::sync::Mutex::new(None),
        }))
    }

    // ===== Command Surface =====

    /// Begins a run over at most `max_pages` listing pages
    ///
    /// Only valid while idle. The listing tab must be showing a results page of the target
    /// site, otherwise the command is rejected and no run begins.
    pub async fn start(self: &Arc<Self>, max_pages: u32) -> Result<()> {
        self.ensure_phase("start", RunPhase::Idle)?;

        if !(1..=MAX_PAGE_BUDGET).contains(&max_pages) {
            return Err(ConfigError::Validation(format!(
                "max pages must be between 1 and {}, got {}",
                MAX_PAGE_BUDGET, max_pages
            ))
            .into());
        }

        let url = with_retry(self.retry, "read listing URL", || self.navigator.current_url())
            .await
            .map_err(|e| HarvestError::Setup(format!("listing tab is not available: {}", e)))?;

        if !self.site.is_listing_url(&url) {
            return Err(HarvestError::Setup(format!(
                "{} is not a {} listing page",
                url,
                self.site.listing_path()
            )));
        }

        let start_page = self.resolve_start_page(&url).await;

        // Held until the run task is stored so a concurrent stop always finds it to join.
        let mut run = self.run.lock().await;
        {
            let mut state = self.state();
            if state.phase != RunPhase::Idle {
                return Err(HarvestError::InvalidCommand {
                    command: "start",
                    phase: state.phase,
                });
            }
            state.begin_run(start_page, max_pages)?;
            self.control.send_replace(Control::Run);
        }

        if let Err(e) = self.record_run_start(start_page, max_pages) {
            self.abandon_start();
            return Err(e);
        }

        tracing::info!(
            "Run started on page {} with a budget of {} page(s)",
            start_page,
            max_pages
        );
        self.emit(CoordinatorEvent::Started);
        self.status(format!("Starting on page {}", start_page));

        *run = Some(tokio::spawn(Arc::clone(self).drive()));
        Ok(())
    }

    /// Halts queue iteration once the in-flight item has finished
    pub fn pause(&self) -> Result<()> {
        self.transition_for("pause", &[RunPhase::Running], RunPhase::Paused, Control::Pause)?;
        self.persist()?;

        tracing::info!("Run paused");
        self.emit(CoordinatorEvent::Paused);
        Ok(())
    }

    /// Continues queue iteration from the current cursor
    pub fn resume(&self) -> Result<()> {
        self.transition_for("resume", &[RunPhase::Paused], RunPhase::Running, Control::Run)?;
        self.persist()?;

        tracing::info!("Run resumed");
        self.emit(CoordinatorEvent::Resumed);
        Ok(())
    }

    /// Ends the run early and waits for it to wind down
    ///
    /// Any open detail tab is closed and observers receive `Stopped` rather than `Completed`.
    pub async fn stop(&self) -> Result<RunStats> {
        self.transition_for(
            "stop",
            &[RunPhase::Running, RunPhase::Paused],
            RunPhase::Completing,
            Control::Stop,
        )?;
        tracing::info!("Stop requested");

        if let Err(e) = self.persist() {
            tracing::warn!("Failed to persist state on stop: {}", e);
        }

        self.join_run().await;
        Ok(self.stats())
    }

    /// Waits for the current run, if any, to finish
    ///
    /// Concurrent callers of `wait` and `stop` do not both block: whichever joins the run
    /// task first waits for it.
    pub async fn wait(&self) -> RunStats {
        self.join_run().await;
        self.stats()
    }

    /// Snapshot of the machine state
    pub fn get_state(&self) -> CoordinatorState {
        self.state().clone()
    }

    pub fn phase(&self) -> RunPhase {
        self.state().phase
    }

    pub fn stats(&self) -> RunStats {
        self.state().stats()
    }

    /// The whole record collection, in insertion order
    pub fn get_records(&self) -> Result<Vec<Record>> {
        self.with_store(|store| store.load_records())
    }

    /// Removes every record and the checkpoint; rejected while a run is active
    pub fn clear_all(&self) -> Result<()> {
        let mut state = self.state();
        if state.phase != RunPhase::Idle {
            return Err(HarvestError::InvalidCommand {
                command: "clearAll",
                phase: state.phase,
            });
        }

        self.with_store(|store| store.clear_all())?;
        *state = CoordinatorState::new();
        drop(state);

        tracing::info!("Cleared all records and run state");
        self.status("All data cleared");
        Ok(())
    }

    /// Replaces the whole record collection
    pub fn replace_records(&self, records: &[Record]) -> Result<()> {
        self.with_store(|store| store.replace_records(records))?;
        tracing::info!("Record collection replaced ({} records)", records.len());
        Ok(())
    }

    /// Merges a JSON import into the store, skipping anything already known
    pub fn import_records(&self, content: &str) -> Result<ImportSummary> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| HarvestError::Storage("record store lock poisoned".to_string()))?;
        merge_import(&mut **store, &self.matcher, content)
    }

    /// Executes one command from the UI layer
    pub async fn dispatch(self: &Arc<Self>, command: Command) -> Result<Reply> {
        tracing::debug!("Dispatching command {}", command.name());
        match command {
            Command::Start { max_pages } => {
                self.start(max_pages).await?;
                Ok(Reply::Ack)
            }
            Command::Stop => Ok(Reply::Stats(self.stop().await?)),
            Command::Pause => {
                self.pause()?;
                Ok(Reply::Ack)
            }
            Command::Resume => {
                self.resume()?;
                Ok(Reply::Ack)
            }
            Command::GetState => Ok(Reply::State(Box::new(self.get_state()))),
            Command::GetRecords => Ok(Reply::Records(self.get_records()?)),
            Command::ClearAll => {
                self.clear_all()?;
                Ok(Reply::Ack)
            }
            Command::ReplaceRecords { records } => {
                self.replace_records(&records)?;
                Ok(Reply::Ack)
            }
        }
    }

    /// Registers a new observer
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    // ===== Drive Loop =====

    async fn drive(self: Arc<Self>) {
        match self.run_pages().await {
            Ok(()) | Err(HarvestError::Cancelled) => {}
            Err(e) => {
                tracing::error!("Run aborted: {}", e);
                self.state().record_error(format!("Run aborted: {}", e));
            }
        }
        self.finish().await;
    }

    async fn run_pages(&self) -> Result<()> {
        loop {
            self.wait_while_paused().await?;
            self.process_page().await?;
            self.process_queue().await?;

            if self.control() == Control::Stop {
                return Err(HarvestError::Cancelled);
            }

            if !self.state().has_page_budget() {
                tracing::info!("Page budget reached");
                return Ok(());
            }

            self.wait_while_paused().await?;
            if !self.advance().await? {
                return Ok(());
            }
        }
    }

    /// Enumerates the current listing page and queues the items not already collected
    async fn process_page(&self) -> Result<()> {
        let page = self.state().current_page;
        self.status(format!("Reading results on page {}", page));

        let links = match with_retry(self.retry, "enumerate listing items", || {
            self.navigator.extract_item_links()
        })
        .await
        {
            Ok(links) => links,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Could not read items on page {}: {}", page, e);
                self.state()
                    .record_error(format!("Page {}: could not read listing items: {}", page, e));
                Vec::new()
            }
        };

        let found = links.len() as u32;
        let existing = self.with_store(|store| store.load_records())?;

        let mut seen = HashSet::new();
        let mut skipped = 0;
        let queue: Vec<ItemLink> = links
            .into_iter()
            .filter(|link| {
                let key = self
                    .site
                    .normalize_url(&link.url)
                    .unwrap_or_else(|| link.url.clone());
                if !seen.insert(key) {
                    return false;
                }
                let known = self
                    .matcher
                    .is_duplicate(&Record::from_link(link), &existing);
                if known {
                    skipped += 1;
                }
                !known
            })
            .collect();

        tracing::info!(
            "Page {}: {} item(s) found, {} already collected, {} queued",
            page,
            found,
            skipped,
            queue.len()
        );

        {
            let mut state = self.state();
            state.total_found_count += found;
            state.set_queue(queue);
        }
        self.persist()?;

        self.emit(CoordinatorEvent::ItemsFoundOnPage {
            count: found,
            page_number: page,
        });
        Ok(())
    }

    async fn process_queue(&self) -> Result<()> {
        loop {
            self.wait_while_paused().await?;

            let Some(link) = self.state().next_item().cloned() else {
                return Ok(());
            };

            match self.process_item(&link).await {
                Ok(()) => {}
                Err(HarvestError::Cancelled) => return Err(HarvestError::Cancelled),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Item {} failed: {}", link.url, e);
                    if matches!(e, HarvestError::RateLimited(_)) {
                        self.limiter.throttle(self.throttle);
                    }
                    self.state().record_error(format!("{}: {}", link.url, e));
                }
            }

            self.state().advance_cursor();
            self.persist()?;
        }
    }

    async fn process_item(&self, link: &ItemLink) -> Result<()> {
        // The store may have changed since the page was pre-filtered, e.g. by an import.
        let queued = Record::from_link(link);
        let existing = self.with_store(|store| store.load_records())?;
        if self.matcher.is_duplicate(&queued, &existing) {
            tracing::debug!("Skipping {}: collected since the page was read", link.url);
            self.count_processed(queued, true)?;
            return Ok(());
        }

        let detail_url = self
            .site
            .detail_url(&link.url)
            .unwrap_or_else(|| link.url.clone());
        let canonical = self
            .site
            .canonical_url(&link.url)
            .unwrap_or_else(|| link.url.clone());

        let throttled = self.limiter.throttle_remaining();
        if !throttled.is_zero() {
            self.status(format!("Rate limited; pausing for {}s", throttled.as_secs()));
            self.unless_stopped(tokio::time::sleep(throttled)).await?;
        }
        self.unless_stopped(self.limiter.wait()).await?;

        self.status(format!(
            "Visiting {}",
            link.display_name.as_deref().unwrap_or(&canonical)
        ));
        let tab = with_retry(self.retry, "open detail tab", || self.details.open(&detail_url))
            .await?;
        *lock(&self.open_tab) = Some(tab.clone());

        let visited = self.visit(&tab, link, &canonical).await;
        self.close_tab(&tab).await;

        let record = visited?;
        let existing = self.with_store(|store| store.load_records())?;
        if let Some(found) = self.matcher.find_duplicate(&record, &existing) {
            tracing::debug!(
                "Skipping {}: matches an existing record by {}",
                record.url,
                found.kind.as_str()
            );
            self.count_processed(record, true)?;
        } else {
            self.with_store(|store| store.append_record(&record))?;
            tracing::debug!("Collected {} ({})", record.name, record.url);
            self.count_processed(record, false)?;
        }
        Ok(())
    }

    async fn visit(&self, tab: &DetailTab, link: &ItemLink, canonical: &str) -> Result<Record> {
        let loaded = self
            .unless_stopped(
                self.details
                    .wait_loaded(tab, self.settings.tab_load_timeout()),
            )
            .await?;
        if !loaded {
            tracing::debug!("{} did not finish loading; extracting anyway", tab.url);
        }

        let fields = with_retry(self.retry, "extract detail", || self.details.extract(tab))
            .await
            .map_err(|e| match e {
                HarvestError::RateLimited(_)
                | HarvestError::Fatal(_)
                | HarvestError::Cancelled
                | HarvestError::Extraction { .. } => e,
                other => HarvestError::Extraction {
                    url: tab.url.clone(),
                    message: other.to_string(),
                },
            })?;

        Ok(Record::from_detail(
            fields,
            link.display_name.as_deref(),
            canonical,
            Utc::now(),
        ))
    }

    /// Moves the listing forward one page
    ///
    /// Returns false when no further page could be reached.
    async fn advance(&self) -> Result<bool> {
        let url = with_retry(self.retry, "read listing URL", || self.navigator.current_url())
            .await
            .map_err(|e| HarvestError::Fatal(format!("listing tab is unreachable: {}", e)))?;

        if !self.site.is_listing_url(&url) {
            return Err(HarvestError::Fatal(format!(
                "listing tab left the results pages and is now at {}",
                url
            )));
        }

        // The hint is unreliable; an advance is attempted either way.
        match self.navigator.has_next_page().await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("No next-page control visible; trying to advance anyway"),
            Err(e) => tracing::debug!("Next-page check failed: {}", e),
        }

        let next_page = self.state().current_page + 1;
        self.status(format!("Moving to page {}", next_page));

        let timeout = self.settings.navigation_timeout();
        let advanced = match with_retry(self.retry, "advance listing", || {
            self.navigator.advance_to_next_page(timeout)
        })
        .await
        {
            Ok(advanced) => advanced,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Could not advance to page {}: {}", next_page, e);
                self.state()
                    .record_error(format!("Could not advance to page {}: {}", next_page, e));
                false
            }
        };

        if !advanced {
            let (found, processed) = {
                let state = self.state();
                (state.total_found_count, state.processed_count)
            };
            if found == 0 && processed == 0 {
                let message = format!(
                    "No items found on {}; the tab may not be a results listing",
                    url
                );
                tracing::warn!("{}", message);
                self.state().record_error(message);
            } else {
                tracing::info!("Last page reached at page {}", next_page - 1);
            }
            return Ok(false);
        }

        {
            let mut state = self.state();
            state.current_page = next_page;
            state.touch();
        }
        self.persist()?;

        let ready = self
            .unless_stopped(
                self.navigator
                    .wait_for_content(self.settings.content_timeout()),
            )
            .await?;
        if !ready {
            tracing::debug!("Page {} content not detected in time; continuing", next_page);
        }
        Ok(true)
    }

    async fn finish(&self) {
        let stopped = {
            let mut state = self.state();
            if state.phase.is_active() {
                if let Err(e) = state.transition(RunPhase::Completing) {
                    tracing::warn!("{}", e);
                }
            }
            self.control() == Control::Stop
        };

        let lingering = lock(&self.open_tab).take();
        if let Some(tab) = lingering {
            self.close_tab(&tab).await;
        }

        let (stats, run_id) = {
            let mut state = self.state();
            if let Err(e) = state.transition(RunPhase::Idle) {
                tracing::warn!("{}", e);
            }
            (state.stats(), state.run_id)
        };

        if let Err(e) = self.persist() {
            tracing::error!("Failed to persist final state: {}", e);
        }

        if let Some(run_id) = run_id {
            let status = if stopped {
                RunStatus::Stopped
            } else {
                RunStatus::Completed
            };
            if let Err(e) = self.with_store(|store| store.finish_run(run_id, status, &stats)) {
                tracing::error!("Failed to record end of run {}: {}", run_id, e);
            }
        }

        tracing::info!(
            "Run {}: {} page(s), {} item(s) found, {} processed, {} error(s)",
            if stopped { "stopped" } else { "completed" },
            stats.pages_reached,
            stats.items_found,
            stats.items_processed,
            stats.error_count
        );

        if stopped {
            self.emit(CoordinatorEvent::Stopped { stats });
        } else {
            self.emit(CoordinatorEvent::Completed { stats });
        }
    }

    // ===== Helpers =====

    async fn resolve_start_page(&self, url: &str) -> u32 {
        if let Some(page) = page_number_from_url(url) {
            return page;
        }
        match self.navigator.detect_page_number().await {
            Ok(Some(page)) => page,
            Ok(None) => 1,
            Err(e) => {
                tracing::debug!("Page number detection failed: {}", e);
                1
            }
        }
    }

    fn record_run_start(&self, start_page: u32, max_pages: u32) -> Result<()> {
        let run_id =
            self.with_store(|store| store.begin_run(start_page, max_pages, &self.config_hash))?;
        self.state().run_id = Some(run_id);
        self.persist()
    }

    fn abandon_start(&self) {
        let mut state = self.state();
        for next in [RunPhase::Completing, RunPhase::Idle] {
            if let Err(e) = state.transition(next) {
                tracing::warn!("{}", e);
            }
        }
    }

    async fn join_run(&self) {
        let handle = self.run.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Run task ended abnormally: {}", e);
            }
        }
    }

    fn count_processed(&self, record: Record, skipped: bool) -> Result<()> {
        let processed_count = {
            let mut state = self.state();
            state.processed_count += 1;
            state.touch();
            state.processed_count
        };
        self.persist()?;

        self.emit(CoordinatorEvent::ItemProcessed {
            record,
            processed_count,
            skipped,
        });
        Ok(())
    }

    async fn close_tab(&self, tab: &DetailTab) {
        if let Err(e) = self.details.close(tab).await {
            tracing::warn!("Failed to close detail tab {}: {}", tab.url, e);
        }
        let mut open = lock(&self.open_tab);
        if open.as_ref() == Some(tab) {
            *open = None;
        }
    }

    /// Suspends until the run is not paused; fails if it is stopped instead
    async fn wait_while_paused(&self) -> Result<()> {
        let mut control = self.control.subscribe();
        loop {
            let current = *control.borrow_and_update();
            match current {
                Control::Run => return Ok(()),
                Control::Stop => return Err(HarvestError::Cancelled),
                Control::Pause => {}
            }
            if control.changed().await.is_err() {
                return Err(HarvestError::Cancelled);
            }
        }
    }

    /// Runs `fut` unless a stop request arrives first
    async fn unless_stopped<F: Future>(&self, fut: F) -> Result<F::Output> {
        let mut control = self.control.subscribe();
        let stopped = async move {
            let _ = control.wait_for(|c| *c == Control::Stop).await;
        };

        tokio::select! {
            output = fut => Ok(output),
            _ = stopped => Err(HarvestError::Cancelled),
        }
    }

    /// Moves to `next` on behalf of `command`, which is only valid from the `from` phases
    ///
    /// The run task is signalled while the state lock is held, so it never observes the new
    /// phase with a stale signal.
    fn transition_for(
        &self,
        command: &'static str,
        from: &[RunPhase],
        next: RunPhase,
        signal: Control,
    ) -> Result<()> {
        let mut state = self.state();
        if !from.contains(&state.phase) {
            return Err(HarvestError::InvalidCommand {
                command,
                phase: state.phase,
            });
        }
        state.transition(next)?;
        self.control.send_replace(signal);
        Ok(())
    }

    fn ensure_phase(&self, command: &'static str, expected: RunPhase) -> Result<()> {
        let phase = self.state().phase;
        if phase != expected {
            return Err(HarvestError::InvalidCommand { command, phase });
        }
        Ok(())
    }

    fn control(&self) -> Control {
        *self.control.borrow()
    }

    fn state(&self) -> MutexGuard<'_, CoordinatorState> {
        lock(&self.state)
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut dyn Store) -> StorageResult<T>) -> Result<T> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| HarvestError::Storage("record store lock poisoned".to_string()))?;
        Ok(f(&mut **store)?)
    }

    fn persist(&self) -> Result<()> {
        let snapshot = self.state().clone();
        self.with_store(|store| store.save_state(&snapshot))
    }

    fn status(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!("{}", text);
        self.emit(CoordinatorEvent::status(text));
    }

    fn emit(&self, event: CoordinatorEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}
