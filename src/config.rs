// src/config.rs
// =============================================================================
// Defaults and the typed run configuration.
//
// Every knob the CLI exposes has its default here, so the command-line layer
// and the tests agree on the same values.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::checker::{RetryPolicy, SkipPatterns};

/// Concurrent link checks in flight ("low tens" keeps per-host rate limits happy)
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Per-request timeout in seconds, for both page fetches and link probes
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Hard ceiling on pages visited by a recursive crawl
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Total attempts (first try + retries) for transient network failures
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base of the exponential backoff between attempts, in milliseconds
pub const RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Upper bound for a single backoff sleep
pub const RETRY_MAX_DELAY_SECS: u64 = 10;

/// Redirect hops followed before a link counts as broken
pub const MAX_REDIRECTS: usize = 5;

/// Pause between page fetches while crawling
pub const CRAWL_DELAY_MS: u64 = 100;

/// After load, rendered pages are polled until their link count stops
/// changing (scripts and XHR-fed listings have finished), up to a limit
pub const RENDER_SETTLE_POLL_MS: u64 = 250;
pub const RENDER_SETTLE_STABLE_POLLS: u32 = 2;
pub const RENDER_SETTLE_MAX_MS: u64 = 5_000;

pub const DEFAULT_REPORTS_DIR: &str = "reports";

pub const REPORT_FILE_STEM: &str = "check-links-report";
pub const BROKEN_REPORT_FILE_STEM: &str = "check-links-broken-report";
pub const LINKS_FILE_STEM: &str = "get-links";

/// `check` without a links file reads the one collected this many days ago
pub const LINKS_FILE_AGE_DAYS: u64 = 7;

pub const USER_AGENT: &str = concat!("link-sentinel/", env!("CARGO_PKG_VERSION"));

/// DOI resolvers rate-limit automated checks; images are never worth a request.
pub const DEFAULT_SKIP_PATTERNS: &[&str] = &[
    r"^https?://(dx\.)?doi\.org/",
    r"(?i)\.(png|jpe?g|gif|svg|webp|ico|bmp)(\?.*)?$",
];

/// How the Collector walks the site.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Follow in-domain links transitively
    pub recurse: bool,
    pub max_pages: usize,
    /// `None` means only `max_pages` bounds the crawl
    pub max_depth: Option<usize>,
    pub delay: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            recurse: false,
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: None,
            delay: Duration::from_millis(CRAWL_DELAY_MS),
        }
    }
}

/// How the Validator checks links.
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }
}

/// Everything a single run needs, already validated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub crawl: CrawlOptions,
    pub validator: ValidatorOptions,
    pub skip: SkipPatterns,
    pub recipients: Vec<String>,
    pub reports_dir: PathBuf,
}

impl RunConfig {
    /// Every default and no skip patterns; the CLI adds the built-in ones.
    pub fn new() -> Self {
        Self {
            crawl: CrawlOptions::default(),
            validator: ValidatorOptions::default(),
            skip: SkipPatterns::none(),
            recipients: Vec::new(),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}
