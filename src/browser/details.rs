use crate::browser::classify_cdp_error;
use crate::browser::extract::{extract_detail, looks_rate_limited};
use crate::crawler::{lock, DetailBrowser, DetailTab};
use crate::records::DetailFields;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Opens one browser tab per detail page
pub struct ChromeDetails {
    browser: Arc<Browser>,
    user_agent: Option<String>,
    tabs: Mutex<HashMap<u64, Page>>,
    next_id: AtomicU64,
}

impl ChromeDetails {
    pub fn new(browser: Arc<Browser>, user_agent: Option<String>) -> Self {
        Self {
            browser,
            user_agent,
            tabs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn page(&self, tab: &DetailTab) -> Result<Page> {
        lock(&self.tabs)
            .get(&tab.id)
            .cloned()
            .ok_or_else(|| HarvestError::Browser(format!("detail tab {} is not open", tab.url)))
    }
}

#[async_trait]
impl DetailBrowser for ChromeDetails {
    async fn open(&self, url: &str) -> Result<DetailTab> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| classify_cdp_error("open detail tab", e))?;

        if let Some(user_agent) = &self.user_agent {
            if let Err(e) = page.set_user_agent(user_agent.as_str()).await {
                tracing::warn!("Failed to set user agent: {}", e);
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.tabs).insert(id, page);
        Ok(DetailTab {
            id,
            url: url.to_string(),
        })
    }

    async fn wait_loaded(&self, tab: &DetailTab, timeout: Duration) -> bool {
        let Ok(page) = self.page(tab) else {
            return false;
        };
        matches!(
            tokio::time::timeout(timeout, page.wait_for_navigation()).await,
            Ok(Ok(_))
        )
    }

    async fn extract(&self, tab: &DetailTab) -> Result<DetailFields> {
        let page = self.page(tab)?;
        let html = page
            .content()
            .await
            .map_err(|e| classify_cdp_error("read detail page", e))?;

        if looks_rate_limited(&html) {
            return Err(HarvestError::RateLimited(format!(
                "{} shows a verification or rate-limit page",
                tab.url
            )));
        }

        Ok(extract_detail(&html))
    }

    async fn close(&self, tab: &DetailTab) -> Result<()> {
        let page = lock(&self.tabs).remove(&tab.id);
        match page {
            Some(page) => page
                .close()
                .await
                .map_err(|e| classify_cdp_error("close detail tab", e)),
            None => Ok(()),
        }
    }
}
