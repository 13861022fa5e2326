// src/report/builder.rs
// =============================================================================
// The Report Builder.
//
// A Report is identified by its date alone: running twice on the same day
// produces the same file names (and, for an unchanged site, the same bytes).
// The broken subset is always derived from `records`, never stored.
// =============================================================================

use chrono::NaiveDate;

use crate::config::{BROKEN_REPORT_FILE_STEM, REPORT_FILE_STEM};
use crate::model::{LinkState, ValidationResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub generated_at: NaiveDate,
    pub records: Vec<ValidationResult>,
    /// The run was cancelled before every link was checked
    pub partial: bool,
    /// Why no data could be produced (seed unreachable, ...)
    pub degraded: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportCounts {
    pub ok: usize,
    pub broken: usize,
    pub skipped: usize,
}

impl ReportCounts {
    pub fn total(&self) -> usize {
        self.ok + self.broken + self.skipped
    }

    /// Links that were actually requested
    pub fn checked(&self) -> usize {
        self.ok + self.broken
    }
}

impl Report {
    pub fn build(results: Vec<ValidationResult>, date: NaiveDate) -> Self {
        Self {
            generated_at: date,
            records: results,
            partial: false,
            degraded: None,
        }
    }

    /// A report from a run that was cancelled before every link was checked.
    pub fn build_partial(results: Vec<ValidationResult>, date: NaiveDate) -> Self {
        Self {
            partial: true,
            ..Self::build(results, date)
        }
    }

    /// An empty report for a run whose earlier stages produced no data.
    pub fn degraded(date: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            degraded: Some(reason.into()),
            ..Self::build(Vec::new(), date)
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    pub fn broken_subset(&self) -> impl Iterator<Item = &ValidationResult> {
        self.records.iter().filter(|r| r.is_broken())
    }

    pub fn broken_links_found(&self) -> bool {
        self.broken_subset().next().is_some()
    }

    pub fn counts(&self) -> ReportCounts {
        self.records
            .iter()
            .fold(ReportCounts::default(), |mut counts, r| {
                match r.state {
                    LinkState::Ok => counts.ok += 1,
                    LinkState::Broken => counts.broken += 1,
                    LinkState::Skipped => counts.skipped += 1,
                }
                counts
            })
    }

    pub fn file_name(&self) -> String {
        dated_file_name(REPORT_FILE_STEM, self.generated_at)
    }

    pub fn broken_file_name(&self) -> String {
        dated_file_name(BROKEN_REPORT_FILE_STEM, self.generated_at)
    }
}

/// `<stem>-YYYY-MM-DD.csv`
pub fn dated_file_name(stem: &str, date: NaiveDate) -> String {
    format!("{}-{}.csv", stem, date.format("%Y-%m-%d"))
}
