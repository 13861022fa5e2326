// src/error.rs
// =============================================================================
// Typed errors for each pipeline stage.
//
// The binary wraps these in anyhow::Error with context; inside the pipeline
// each stage decides which of them are terminal and which only get logged.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// A single page could not be fetched (and rendered).
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error("browser error: {0}")]
    Browser(String),
}

/// Collection as a whole failed; the run cannot produce a report.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("seed page {url} is unreachable: {source}")]
    SeedUnreachable {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("collection was cancelled before the seed page was fetched")]
    Cancelled,
}

/// Why a probe did not produce an HTTP status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Timeouts, refused connections, DNS failures: worth another try
    #[error("{0}")]
    Transient(String),

    /// Invalid URL, redirect loop, ...: retrying will not help
    #[error("{0}")]
    Permanent(String),
}

impl ProbeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProbeError::Transient(_))
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("could not create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid skip pattern: {0}")]
    SkipPattern(#[from] regex::Error),

    #[error("invalid seed URL '{url}': {reason}")]
    Seed { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
