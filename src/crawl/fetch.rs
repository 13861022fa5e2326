// src/crawl/fetch.rs
// =============================================================================
// Page fetch strategies.
//
// The crawler only needs "give me the HTML of this page". How it is obtained
// is pluggable:
// - HttpFetcher: a plain GET, fast, sees only server-rendered markup
// - BrowserFetcher (browser.rs): headless Chrome, runs the page's scripts
//   first so JavaScript-rendered link lists are visible
// =============================================================================

use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

use crate::error::FetchError;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page's HTML after any rendering the strategy performs.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Fetches pages with a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        // Images, PDFs, ... have no links to extract
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("html"))
            .unwrap_or(true);
        if !is_html {
            debug!("{} is not HTML, no links extracted", url);
            return Ok(String::new());
        }

        Ok(response.text().await?)
    }
}
