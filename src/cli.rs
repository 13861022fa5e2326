// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every option can also come from an environment variable, which is how a
// scheduled workflow configures the checker (seed URL, skip patterns,
// recipients, ...).
//
// The structs here only hold raw arguments; `run_config` turns them into the
// validated RunConfig the pipeline works with.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::checker::{RetryPolicy, SkipPatterns};
use crate::config::{
    CrawlOptions, RunConfig, ValidatorOptions, CRAWL_DELAY_MS, DEFAULT_CONCURRENCY,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PAGES, DEFAULT_REPORTS_DIR, DEFAULT_TIMEOUT_SECS,
};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "link-sentinel",
    version,
    about = "Crawl a website, check every link and write dated broken-link reports",
    long_about = "link-sentinel collects the links on a site (optionally rendering JavaScript \
                  with a headless browser), checks each one, and writes a CSV report of all \
                  links plus one of the broken ones. It is meant to run on a schedule and \
                  hand its outcome to an email step."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect, check and report in one go
    ///
    /// Example: link-sentinel run https://example.com --recurse
    Run {
        /// Seed page(s) to start from; all go into one report
        #[arg(env = "BASE_URL", required = true, value_delimiter = ',')]
        seed_urls: Vec<String>,

        #[command(flatten)]
        crawl: CrawlArgs,

        #[command(flatten)]
        check: CheckArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Only collect links; writes get-links-<date>.csv
    ///
    /// Example: link-sentinel collect https://example.com --recurse --render
    Collect {
        /// Seed page(s) to start from; all go into one links file
        #[arg(env = "BASE_URL", required = true, value_delimiter = ',')]
        seed_urls: Vec<String>,

        #[command(flatten)]
        crawl: CrawlArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Check links from a file written by `collect`
    ///
    /// Example: link-sentinel check reports/get-links-2024-01-01.csv
    Check {
        /// CSV with a header row and url,parent columns
        /// [default: <reports-dir>/get-links-<date a week ago>.csv]
        #[arg(env = "LINKS_FILE")]
        links_file: Option<PathBuf>,

        #[command(flatten)]
        check: CheckArgs,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Follow links on the same host as the seed, not just the seed page
    #[arg(long, env = "RECURSE")]
    pub recurse: bool,

    /// Render pages in headless Chrome so JavaScript-built links are found
    #[arg(long, env = "RENDER")]
    pub render: bool,

    /// Stop crawling after this many pages
    #[arg(long, env = "MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Follow at most this many link hops from the seed (0 = seed only)
    #[arg(long, env = "MAX_DEPTH")]
    pub max_depth: Option<usize>,

    /// Pause between page fetches, in milliseconds
    #[arg(long, env = "CRAWL_DELAY_MS", default_value_t = CRAWL_DELAY_MS)]
    pub crawl_delay_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Regex of URLs to skip; repeatable (comma-separated in the env var)
    #[arg(long = "skip", env = "SKIP_PATTERNS", value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Do not add the built-in DOI and image skip patterns
    #[arg(long)]
    pub no_default_skips: bool,

    /// Links checked at the same time
    #[arg(long, env = "CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Attempts per link for timeouts and connection failures
    #[arg(long = "retries", env = "MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Cancel outstanding checks after this many seconds and report what was gathered
    #[arg(long, env = "RUN_DEADLINE")]
    pub deadline: Option<u64>,

    /// Email recipient for the notification step; repeatable
    #[arg(long = "recipient", env = "RECIPIENTS", value_delimiter = ',')]
    pub recipients: Vec<String>,

    /// Print results as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Directory the CSV files are written to
    #[arg(long, env = "REPORTS_DIR", default_value = DEFAULT_REPORTS_DIR)]
    pub reports_dir: PathBuf,
}

impl CrawlArgs {
    pub fn to_options(&self) -> CrawlOptions {
        CrawlOptions {
            recurse: self.recurse,
            max_pages: self.max_pages.max(1),
            max_depth: self.max_depth,
            delay: Duration::from_millis(self.crawl_delay_ms),
        }
    }
}

impl CheckArgs {
    pub fn skip_patterns(&self) -> Result<SkipPatterns, ConfigError> {
        let patterns = self.skip.iter().map(|p| p.trim()).filter(|p| !p.is_empty());
        if self.no_default_skips {
            SkipPatterns::new(patterns)
        } else {
            SkipPatterns::with_defaults(patterns)
        }
    }

    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            concurrency: self.concurrency.max(1),
            retry: RetryPolicy {
                max_attempts: self.max_attempts.max(1),
                ..RetryPolicy::default()
            },
        }
    }
}

impl CommonArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }
}

/// Parses a seed URL; only absolute http(s) URLs with a host are accepted.
pub fn parse_seed(input: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::Seed {
        url: input.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(input.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https are supported"));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL has no host"));
    }
    Ok(url)
}

/// Parses every seed; the first invalid one is the error.
pub fn parse_seeds(inputs: &[String]) -> Result<Vec<Url>, ConfigError> {
    let seeds = inputs
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(parse_seed)
        .collect::<Result<Vec<_>, _>>()?;

    if seeds.is_empty() {
        return Err(ConfigError::Seed {
            url: String::new(),
            reason: "no seed URL given".to_string(),
        });
    }
    Ok(seeds)
}

pub fn run_config(
    crawl: Option<&CrawlArgs>,
    check: &CheckArgs,
    common: &CommonArgs,
) -> Result<RunConfig, ConfigError> {
    Ok(RunConfig {
        crawl: crawl.map(CrawlArgs::to_options).unwrap_or_default(),
        validator: check.validator_options(),
        skip: check.skip_patterns()?,
        recipients: check
            .recipients
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect(),
        reports_dir: common.reports_dir.clone(),
    })
}
