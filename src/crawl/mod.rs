// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling (the Link Collector).
//
// Features:
// - Breadth-first crawling starting from a seed URL
// - Same-domain restriction for recursion (never crawls external sites)
// - Page and depth ceilings
// - Pluggable page fetching: plain HTTP or a headless browser
// =============================================================================

mod browser;
mod fetch;
mod queue;

pub use browser::BrowserFetcher;
pub use fetch::{HttpFetcher, PageFetcher};
pub use queue::{collect_from_seeds, PageFailure};
