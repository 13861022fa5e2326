// src/checker/validate.rs
// =============================================================================
// The Link Validator: one ValidationResult per LinkRecord, in input order.
//
// - Skip patterns are checked first; skipped links are never requested
// - Everything else goes through a `LinkProbe` with bounded concurrency
// - Transient failures are retried with backoff (see retry.rs)
// - The run's cancellation token stops in-flight work promptly
// =============================================================================

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::retry::RetryPolicy;
use super::skip::SkipPatterns;
use crate::config::ValidatorOptions;
use crate::context::RunContext;
use crate::error::ProbeError;
use crate::model::{LinkRecord, ValidationResult};

/// Issues one request for a URL and reports the final HTTP status.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<u16, ProbeError>;
}

/// What the validator produced.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// Input order; shorter than the input only when `cancelled > 0`
    pub results: Vec<ValidationResult>,
    /// Records left unchecked because the run was cancelled
    pub cancelled: usize,
}

impl Validation {
    pub fn is_partial(&self) -> bool {
        self.cancelled > 0
    }
}

// Checks a batch of links concurrently
//
// `buffered` (not `buffer_unordered`) keeps the output in input order while
// still running up to `concurrency` probes at once.
pub async fn validate_links(
    records: Vec<LinkRecord>,
    skip: &SkipPatterns,
    probe: &dyn LinkProbe,
    options: &ValidatorOptions,
    ctx: &RunContext,
) -> Validation {
    let total = records.len();
    info!(
        "Validating {} link(s) with up to {} concurrent request(s)",
        total, options.concurrency
    );

    let outcomes: Vec<Option<ValidationResult>> = stream::iter(records)
        .map(|record| validate_one(record, skip, probe, &options.retry, &ctx.cancel))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let results: Vec<ValidationResult> = outcomes.into_iter().flatten().collect();
    let cancelled = total - results.len();
    if cancelled > 0 {
        warn!("Validation cancelled: {} of {} link(s) left unchecked", cancelled, total);
    }

    Validation { results, cancelled }
}

// Returns None only when cancelled before an outcome was known
async fn validate_one(
    record: LinkRecord,
    skip: &SkipPatterns,
    probe: &dyn LinkProbe,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> Option<ValidationResult> {
    if let Some(pattern) = skip.matching(&record.url) {
        debug!("Skipping {} (matches {})", record.url, pattern);
        return Some(ValidationResult::skipped(record, pattern));
    }

    let mut attempts = 0;
    loop {
        if cancel.is_cancelled() {
            return None;
        }
        attempts += 1;

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return None,
            outcome = probe.probe(&record.url) => outcome,
        };

        match outcome {
            Ok(code) => {
                debug!("{} -> HTTP {}", record.url, code);
                return Some(ValidationResult::from_status(record, code, attempts));
            }
            Err(error) if error.is_transient() && retry.should_retry(attempts) => {
                let delay = retry.delay(attempts);
                debug!(
                    "{} failed ({}), retry {} in {:?}",
                    record.url, error, attempts, delay
                );
                tokio::select! {
                    _ = cancel.cancelled() => return None,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(error) => {
                debug!("{} failed after {} attempt(s): {}", record.url, attempts, error);
                let message = if attempts > 1 {
                    format!("Failed after {} attempts: {}", attempts, error)
                } else {
                    error.to_string()
                };
                return Some(ValidationResult::network_failure(record, message, attempts));
            }
        }
    }
}
