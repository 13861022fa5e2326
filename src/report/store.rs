// src/report/store.rs
// =============================================================================
// Durable storage for report files.
//
// `ReportStore::store` never fails: a report that did not get written comes
// back as `StoreOutcome::Missing`, which the orchestrator turns into the
// "report unavailable" message.
// =============================================================================

use chrono::{Days, NaiveDate};
use log::{info, warn};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::builder::{dated_file_name, Report};
use super::format::{write_links, write_report_rows};
use crate::config::{LINKS_FILE_AGE_DAYS, LINKS_FILE_STEM};
use crate::error::StoreError;
use crate::model::LinkRecord;

/// Paths of the two artifacts written for a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    pub all: PathBuf,
    pub broken: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Written(StoredReport),
    Missing { reason: String },
}

pub trait ReportStore: Send + Sync {
    fn store(&self, report: &Report) -> StoreOutcome;
}

/// Writes reports into a directory, overwriting same-day files.
#[derive(Debug, Clone)]
pub struct FsReportStore {
    dir: PathBuf,
}

impl FsReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    pub fn write(&self, report: &Report) -> Result<StoredReport, StoreError> {
        self.ensure_dir()?;

        let all = self.dir.join(report.file_name());
        write_file(&all, |file| write_report_rows(file, &report.records))?;

        let broken = self.dir.join(report.broken_file_name());
        write_file(&broken, |file| write_report_rows(file, report.broken_subset()))?;

        Ok(StoredReport { all, broken })
    }

    pub fn links_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(dated_file_name(LINKS_FILE_STEM, date))
    }

    /// The links file a weekly collection wrote before today's check.
    pub fn previous_links_path(&self, today: NaiveDate) -> PathBuf {
        let collected = today
            .checked_sub_days(Days::new(LINKS_FILE_AGE_DAYS))
            .unwrap_or(today);
        self.links_path(collected)
    }

    /// Writes the Collector's output as `get-links-<date>.csv`.
    pub fn write_links(&self, records: &[LinkRecord], date: NaiveDate) -> Result<PathBuf, StoreError> {
        self.ensure_dir()?;
        let path = self.links_path(date);
        write_file(&path, |file| write_links(file, records))?;
        Ok(path)
    }
}

fn write_file<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut BufWriter<File>) -> csv::Result<()>,
{
    let file = File::create(path).map_err(|source| StoreError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut file = BufWriter::new(file);
    write(&mut file).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

impl ReportStore for FsReportStore {
    fn store(&self, report: &Report) -> StoreOutcome {
        match self.write(report) {
            Ok(stored) if stored.all.is_file() => {
                info!("Report written to {}", stored.all.display());
                StoreOutcome::Written(stored)
            }
            Ok(stored) => StoreOutcome::Missing {
                reason: format!("{} was not created", stored.all.display()),
            },
            Err(e) => {
                warn!("Report write failed: {}", e);
                StoreOutcome::Missing { reason: e.to_string() }
            }
        }
    }
}
