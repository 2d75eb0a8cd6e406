use crate::browser::classify_cdp_error;
use crate::browser::extract::{
    control_enabled, detect_page_number, extract_item_links, has_next_button,
    NEXT_BUTTON_SELECTORS,
};
use crate::crawler::{wait_until, ListingNavigator};
use crate::records::ItemLink;
use crate::url::{page_number_from_url, TargetSite};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use std::time::Duration;
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The listing tab of a real browser
pub struct ChromeListing {
    page: Page,
    site: TargetSite,
}

impl ChromeListing {
    pub fn new(page: Page, site: TargetSite) -> Self {
        Self { page, site }
    }

    async fn url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| classify_cdp_error("read listing URL", e))
    }

    async fn html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| classify_cdp_error("read listing content", e))
    }

    /// Clicks the first enabled next-page control, returning false if there is none
    async fn click_next(&self) -> bool {
        for selector in NEXT_BUTTON_SELECTORS {
            let Ok(controls) = self.page.find_elements(*selector).await else {
                continue;
            };
            for control in controls {
                let disabled = control.attribute("disabled").await.ok().flatten();
                let aria_disabled = control.attribute("aria-disabled").await.ok().flatten();
                if !control_enabled(disabled.as_deref(), aria_disabled.as_deref()) {
                    continue;
                }
                if control.click().await.is_ok() {
                    return true;
                }
            }
        }
        false
    }
}

#[async_trait]
impl ListingNavigator for ChromeListing {
    async fn current_url(&self) -> Result<String> {
        self.url().await
    }

    async fn detect_page_number(&self) -> Result<Option<u32>> {
        Ok(detect_page_number(&self.html().await?))
    }

    async fn extract_item_links(&self) -> Result<Vec<ItemLink>> {
        Ok(extract_item_links(&self.html().await?, &self.site))
    }

    async fn has_next_page(&self) -> Result<bool> {
        Ok(has_next_button(&self.html().await?))
    }

    async fn advance_to_next_page(&self, timeout: Duration) -> Result<bool> {
        let before = self.url().await?;

        if !self.click_next().await {
            let Some(next) = fallback_page_url(&self.html().await?, &before) else {
                return Ok(false);
            };
            tracing::debug!("Next-page control not clickable; navigating to {}", next);
            self.page.goto(next.as_str()).await.map_err(|e| {
                HarvestError::Navigation(format!("could not load {}: {}", next, e))
            })?;
        }

        let previous = before.as_str();
        let moved = wait_until(
            || async move {
                self.url()
                    .await
                    .map(|now| now != previous)
                    .unwrap_or(false)
            },
            timeout,
            POLL_INTERVAL,
        )
        .await;

        // Some listings page in place without touching the URL.
        if !moved {
            tracing::debug!("Listing stayed at {} after advancing", before);
        }
        Ok(true)
    }

    async fn wait_for_content(&self, timeout: Duration) -> bool {
        wait_until(
            || async move {
                self.html()
                    .await
                    .map(|html| !extract_item_links(&html, &self.site).is_empty())
                    .unwrap_or(false)
            },
            timeout,
            POLL_INTERVAL,
        )
        .await
    }
}

/// Where to go when the next-page control exists but could not be clicked
///
/// Only listings that already page through a `page` parameter are rewritten.
fn fallback_page_url(html: &str, url: &str) -> Option<String> {
    if page_number_from_url(url).is_none() || !has_next_button(html) {
        return None;
    }
    next_page_url(url)
}

/// The listing URL one page further on, via its `page` query parameter
fn next_page_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    let next = page_number_from_url(raw).unwrap_or(1) + 1;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("page", &next.to_string());
    Some(url.to_string())
}
