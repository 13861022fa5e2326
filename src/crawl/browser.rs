// src/crawl/browser.rs
// =============================================================================
// Headless Chrome page fetcher (chromiumoxide).
//
// Each fetch opens a fresh tab, waits for navigation, then waits for the DOM
// to settle: the number of links is polled until it stops changing, so
// listings filled in by scripts or XHR after load are seen. The tab is
// closed afterwards, on error paths too (see TabGuard).
// The browser's CDP event loop runs on its own tokio task.
// =============================================================================

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

use super::fetch::PageFetcher;
use crate::config::{RENDER_SETTLE_MAX_MS, RENDER_SETTLE_POLL_MS, RENDER_SETTLE_STABLE_POLLS};
use crate::error::FetchError;

const LINK_COUNT_JS: &str = "document.querySelectorAll('a[href]').length";

/// Closes its tab when dropped, e.g. when a fetch times out mid-render.
struct TabGuard {
    page: Page,
    url: String,
    closed: bool,
}

impl TabGuard {
    fn new(page: Page, url: &Url) -> Self {
        Self {
            page,
            url: url.to_string(),
            closed: false,
        }
    }

    async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            debug!("Failed to close tab for {}: {}", self.url, e);
        }
    }
}

impl Drop for TabGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Drop cannot await; hand the close to the runtime
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let page = self.page.clone();
        let url = std::mem::take(&mut self.url);
        runtime.spawn(async move {
            if let Err(e) = page.close().await {
                warn!("Failed to close abandoned tab for {}: {}", url, e);
            }
        });
    }
}

/// Tracks successive link counts; settled once the count has held still.
#[derive(Debug, Default)]
struct Settle {
    last: Option<u64>,
    stable: u32,
}

impl Settle {
    fn observe(&mut self, count: u64) -> bool {
        if self.last == Some(count) {
            self.stable += 1;
        } else {
            self.last = Some(count);
            self.stable = 0;
        }
        self.stable >= RENDER_SETTLE_STABLE_POLLS
    }
}

async fn wait_for_settled_dom(page: &Page) {
    let poll = Duration::from_millis(RENDER_SETTLE_POLL_MS);
    let max_polls = RENDER_SETTLE_MAX_MS / RENDER_SETTLE_POLL_MS;
    let mut settle = Settle::default();

    for _ in 0..max_polls {
        let count = match page.evaluate(LINK_COUNT_JS).await {
            Ok(result) => result.into_value::<u64>().unwrap_or(0),
            Err(e) => {
                debug!("Could not count links while settling: {}", e);
                return;
            }
        };
        if settle.observe(count) {
            return;
        }
        tokio::time::sleep(poll).await;
    }
    debug!("DOM still changing after {}ms; reading it anyway", RENDER_SETTLE_MAX_MS);
}

pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Launches a headless Chrome found on the system.
    pub async fn launch(timeout: Duration) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder()
            .request_timeout(timeout)
            .build()
            .map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event loop stopped: {}", e);
                    break;
                }
            }
        });

        info!("Launched headless browser for page rendering");
        Ok(Self {
            browser,
            handler,
            timeout,
        })
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        self.handler.abort();
    }

    async fn render(&self, url: &Url) -> Result<String, CdpError> {
        let tab = TabGuard::new(self.browser.new_page(url.as_str()).await?, url);

        let html = match tab.page.wait_for_navigation().await {
            Ok(_) => {
                wait_for_settled_dom(&tab.page).await;
                tab.page.content().await
            }
            Err(e) => Err(e),
        };

        tab.close().await;
        html
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    // The whole render, settling included, is bounded by the request timeout
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        match tokio::time::timeout(self.timeout, self.render(url)).await {
            Ok(Ok(html)) => Ok(html),
            Ok(Err(e)) => Err(FetchError::Browser(e.to_string())),
            Err(_) => Err(FetchError::Timeout(self.timeout.as_secs())),
        }
    }
}
