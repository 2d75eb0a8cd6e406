//! Crawler module: the harvest state machine and what it drives
//!
//! This module contains the core harvesting logic, including:
//! - Request pacing (`RateLimiter`)
//! - Bounded retry and condition waits
//! - The collaborator contracts for the listing tab and detail tabs
//! - The command/notification protocol
//! - Overall run coordination (`Coordinator`)

mod coordinator;
mod events;
mod limiter;
mod retry;

pub use coordinator::{merge_import, Coordinator, CoordinatorOptions, ImportSummary};
pub use events::{Command, CoordinatorEvent, Reply};
pub use limiter::RateLimiter;
pub use retry::{wait_until, with_retry, RetryPolicy};

pub use crate::state::RunStats;

use crate::records::{DetailFields, ItemLink};
use crate::Result;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Drives the listing tab one results page at a time
#[async_trait]
pub trait ListingNavigator: Send + Sync {
    /// URL the listing tab is currently showing
    async fn current_url(&self) -> Result<String>;

    /// Page number inferred from the page content, if any
    async fn detect_page_number(&self) -> Result<Option<u32>>;

    /// Entity links on the current results page, in display order
    async fn extract_item_links(&self) -> Result<Vec<ItemLink>>;

    /// Best-effort hint that a further page exists; may report false negatives
    async fn has_next_page(&self) -> Result<bool>;

    /// Moves to the next results page
    ///
    /// Returns false only when no enabled next-page control exists, which is taken as the
    /// last page. Once a control has been activated the result is true even if the
    /// listing is slow to show the new page.
    async fn advance_to_next_page(&self, timeout: Duration) -> Result<bool>;

    /// Waits for the results of a freshly loaded page to render
    ///
    /// Returns false on timeout.
    async fn wait_for_content(&self, timeout: Duration) -> bool;
}

/// A detail-page context opened for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTab {
    pub id: u64,
    pub url: String,
}

/// Opens, reads and closes detail pages
#[async_trait]
pub trait DetailBrowser: Send + Sync {
    async fn open(&self, url: &str) -> Result<DetailTab>;

    /// Waits until the tab has finished loading; false on timeout
    async fn wait_loaded(&self, tab: &DetailTab, timeout: Duration) -> bool;

    /// Pulls the structured fields out of a loaded tab
    ///
    /// Missing fields come back as `None`; only an unreadable page is an error.
    async fn extract(&self, tab: &DetailTab) -> Result<DetailFields>;

    async fn close(&self, tab: &DetailTab) -> Result<()>;
}

// Every critical section guarded this way is a plain field update, so a poisoned lock still
// holds a consistent value.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
