// src/context.rs
// =============================================================================
// Per-run state handed explicitly to every stage: the run date (which names
// the report files) and the cancellation signal.
// =============================================================================

use chrono::{Local, NaiveDate};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RunContext {
    pub date: NaiveDate,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            cancel: CancellationToken::new(),
        }
    }

    /// Context for a run starting now, dated in local time.
    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
