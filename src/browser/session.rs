use crate::browser::classify_cdp_error;
use crate::config::BrowserConfig;
use crate::url::TargetSite;
use crate::{HarvestError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A running or attached Chromium instance
pub struct BrowserSession {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    attached: bool,
}

impl BrowserSession {
    /// Attaches to `debugger-url` if configured, otherwise launches a browser
    ///
    /// Attaching is the usual setup: the target site only shows listings to a signed-in
    /// viewer, and a launched browser has no session unless `user-data-dir` points at one.
    pub async fn open(config: &BrowserConfig) -> Result<Self> {
        let attached = config.debugger_url.is_some();

        let (browser, mut handler) = match &config.debugger_url {
            Some(ws_url) => {
                tracing::info!("Attaching to browser at {}", ws_url);
                Browser::connect(ws_url.clone()).await.map_err(|e| {
                    HarvestError::Browser(format!("Failed to attach to {}: {}", ws_url, e))
                })?
            }
            None => {
                let mut builder = ChromeConfig::builder().arg("--disable-dev-shm-usage");
                if !config.headless {
                    builder = builder.with_head();
                }
                if let Some(dir) = &config.user_data_dir {
                    builder = builder.user_data_dir(dir);
                }

                let chrome_config = builder.build().map_err(|e| {
                    HarvestError::Browser(format!("Failed to build browser config: {}", e))
                })?;

                tracing::info!("Launching browser (headless: {})", config.headless);
                Browser::launch(chrome_config).await.map_err(|e| {
                    HarvestError::Browser(format!(
                        "Failed to launch browser: {}. Is Chrome or Chromium installed?",
                        e
                    ))
                })?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            handler,
            attached,
        })
    }

    pub fn browser(&self) -> Arc<Browser> {
        Arc::clone(&self.browser)
    }

    /// Finds the tab showing a listing page, opening `listing_url` if none does
    pub async fn listing_tab(&self, site: &TargetSite, listing_url: Option<&str>) -> Result<Page> {
        let pages = self
            .browser
            .pages()
            .await
            .map_err(|e| classify_cdp_error("list open tabs", e))?;

        for page in pages {
            if let Ok(Some(url)) = page.url().await {
                if site.is_listing_url(&url) {
                    tracing::info!("Using open listing tab {}", url);
                    return Ok(page);
                }
            }
        }

        let Some(url) = listing_url else {
            return Err(HarvestError::Setup(
                "no open tab shows a listing page and no listing-url is configured".to_string(),
            ));
        };

        tracing::info!("Opening listing {}", url);
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| classify_cdp_error("open listing tab", e))?;
        if let Err(e) = page.wait_for_navigation().await {
            tracing::warn!("Listing did not finish loading: {}", e);
        }
        Ok(page)
    }

    /// Stops the event handler; a launched browser is also closed
    ///
    /// An attached browser belongs to the user and is left running.
    pub async fn shutdown(self) {
        if !self.attached {
            match Arc::try_unwrap(self.browser) {
                Ok(mut browser) => {
                    if let Err(e) = browser.close().await {
                        tracing::warn!("Failed to close browser: {}", e);
                    }
                    if let Err(e) = browser.wait().await {
                        tracing::warn!("Browser did not exit cleanly: {}", e);
                    }
                }
                Err(_) => tracing::debug!("Browser still shared; leaving it to drop"),
            }
        }
        self.handler.abort();
    }
}
