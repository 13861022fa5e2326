// src/run/messages.rs
// =============================================================================
// The fixed set of status messages a run can end with.
// =============================================================================

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Report written, no broken links
    Clean,
    /// Report written, at least one broken link
    BrokenLinks,
    /// No report file: the seed was unreachable or the write failed
    ReportUnavailable,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Clean => "clean",
            RunStatus::BrokenLinks => "broken links found",
            RunStatus::ReportUnavailable => "report unavailable",
        };
        f.write_str(s)
    }
}

pub const BROKEN_BODY: &str =
    "Broken links have been detected. Please check attached report for all link details.";
pub const CLEAN_BODY: &str =
    "No broken links found. Please check attached report for all link details.";
pub const PARTIAL_NOTE: &str = " Note: the run was cancelled before every link was checked.";
pub const TRUNCATED_NOTE: &str = " Note: the crawl stopped at its page limit, so some pages were not scanned.";

/// How complete the run was, beyond broken / clean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunNotes {
    /// Cancelled before every link was checked
    pub partial: bool,
    /// The crawl hit its page ceiling with pages still queued
    pub truncated: bool,
    /// Pages (or extra seeds) that could not be fetched
    pub failed_pages: usize,
}

impl RunNotes {
    fn render(&self) -> String {
        let mut notes = String::new();
        if self.partial {
            notes.push_str(PARTIAL_NOTE);
        }
        if self.truncated {
            notes.push_str(TRUNCATED_NOTE);
        }
        if self.failed_pages > 0 {
            notes.push_str(&format!(
                " Note: {} page(s) could not be crawled, so links on them were not checked.",
                self.failed_pages
            ));
        }
        notes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub subject: String,
    pub body: String,
}

/// Picks the template for `status`. `target` names what was checked (the
/// seed URL or the links file), `reason` explains a missing report.
pub fn status_message(
    status: RunStatus,
    target: &str,
    notes: &RunNotes,
    reason: Option<&str>,
) -> StatusMessage {
    let notes = notes.render();

    match status {
        RunStatus::BrokenLinks => StatusMessage {
            subject: format!("Broken links detected on {}", target),
            body: format!("{}{}", BROKEN_BODY, notes),
        },
        RunStatus::Clean => StatusMessage {
            subject: format!("No broken links on {}", target),
            body: format!("{}{}", CLEAN_BODY, notes),
        },
        RunStatus::ReportUnavailable => StatusMessage {
            subject: format!("Link report unavailable for {}", target),
            body: format!(
                "The link report could not be generated ({}). Link status is unknown for this run.",
                reason.unwrap_or("unknown error")
            ),
        },
    }
}
