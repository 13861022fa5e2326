// src/run/orchestrator.rs
// =============================================================================
// The Run Orchestrator: Collector -> Validator -> Report Builder, then the
// outcome and status message.
//
// A run always ends with a RunOutcome. Failures along the way only change
// which message it carries:
// - every seed unreachable   -> degraded (empty) report, "report unavailable"
// - report write failed      -> "report unavailable"
// - cancelled, nothing probed -> "report unavailable"; no link status is known
// - cancelled mid-check      -> partial report, normal template plus a note
// - crawl hit its page limit or lost pages -> normal template plus a note
// =============================================================================

use log::{error, info, warn};
use std::path::PathBuf;
use url::Url;

use super::messages::{status_message, RunNotes, RunStatus, StatusMessage};
use super::notify::Notification;
use crate::checker::{validate_links, LinkProbe};
use crate::config::RunConfig;
use crate::context::RunContext;
use crate::crawl::{collect_from_seeds, PageFailure, PageFetcher};
use crate::model::LinkRecord;
use crate::report::{Report, ReportStore, StoreOutcome, StoredReport};

const NOTHING_CHECKED: &str = "the run was cancelled before any link was checked";

/// The collaborators a run talks to.
pub struct Pipeline<'a> {
    pub fetcher: &'a dyn PageFetcher,
    pub probe: &'a dyn LinkProbe,
    pub store: &'a dyn ReportStore,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub broken_links_found: bool,
    pub message: StatusMessage,
    pub report: Report,
    pub stored: Option<StoredReport>,
    pub notes: RunNotes,
    pub failed_pages: Vec<PageFailure>,
}

impl RunOutcome {
    /// 0 = clean, 1 = broken links, 2 = no report
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Clean => 0,
            RunStatus::BrokenLinks => 1,
            RunStatus::ReportUnavailable => 2,
        }
    }

    pub fn notification(&self, recipients: &[String]) -> Notification {
        Notification {
            subject: self.message.subject.clone(),
            body: self.message.body.clone(),
            attachment: self.stored.as_ref().map(|s| s.all.clone()),
            broken_attachment: self.stored.as_ref().map(|s| s.broken.clone()),
            recipients: recipients.to_vec(),
            broken_links_found: self.broken_links_found,
        }
    }

    pub fn report_path(&self) -> Option<&PathBuf> {
        self.stored.as_ref().map(|s| &s.all)
    }
}

/// Label used in messages: the seed, or the first seed and a count.
pub fn target_label(seeds: &[Url]) -> String {
    match seeds {
        [] => String::from("(no seed)"),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} and {} other page(s)", first, rest.len()),
    }
}

/// Full pipeline from one or more seed URLs.
pub async fn run(seeds: &[Url], config: &RunConfig, ctx: &RunContext, pipeline: &Pipeline<'_>) -> RunOutcome {
    let target = target_label(seeds);
    info!("Starting link collection for {}", target);

    let collection = match collect_from_seeds(seeds, &config.crawl, pipeline.fetcher, ctx).await {
        Ok(collection) => collection,
        Err(e) => {
            error!("Link collection failed: {}", e);
            let report = Report::degraded(ctx.date, e.to_string());
            return finish(&target, report, RunNotes::default(), pipeline.store);
        }
    };

    if !collection.failed_pages.is_empty() {
        warn!("{} page(s) could not be crawled", collection.failed_pages.len());
    }

    let notes = RunNotes {
        partial: collection.cancelled,
        truncated: collection.truncated,
        failed_pages: collection.failed_pages.len(),
    };
    let mut outcome = validate_and_finish(collection.records, &target, notes, config, ctx, pipeline).await;
    outcome.failed_pages = collection.failed_pages;
    outcome
}

/// Validator onwards, for an already collected list of links.
pub async fn check(
    records: Vec<LinkRecord>,
    target: &str,
    config: &RunConfig,
    ctx: &RunContext,
    pipeline: &Pipeline<'_>,
) -> RunOutcome {
    validate_and_finish(records, target, RunNotes::default(), config, ctx, pipeline).await
}

async fn validate_and_finish(
    records: Vec<LinkRecord>,
    target: &str,
    mut notes: RunNotes,
    config: &RunConfig,
    ctx: &RunContext,
    pipeline: &Pipeline<'_>,
) -> RunOutcome {
    let validation = validate_links(records, &config.skip, pipeline.probe, &config.validator, ctx).await;
    notes.partial |= validation.is_partial();

    let report = if notes.partial {
        Report::build_partial(validation.results, ctx.date)
    } else {
        Report::build(validation.results, ctx.date)
    };

    finish(target, report, notes, pipeline.store)
}

fn finish(target: &str, report: Report, notes: RunNotes, store: &dyn ReportStore) -> RunOutcome {
    // A cancelled run that checked nothing says nothing about link health
    let nothing_checked = report.partial && report.counts().checked() == 0;

    let stored = match &report.degraded {
        Some(reason) => StoreOutcome::Missing {
            reason: reason.clone(),
        },
        None if nothing_checked => StoreOutcome::Missing {
            reason: NOTHING_CHECKED.to_string(),
        },
        None => store.store(&report),
    };

    let broken_links_found = report.broken_links_found();
    let (status, stored, reason) = match stored {
        StoreOutcome::Written(stored) if broken_links_found => (RunStatus::BrokenLinks, Some(stored), None),
        StoreOutcome::Written(stored) => (RunStatus::Clean, Some(stored), None),
        StoreOutcome::Missing { reason } => (RunStatus::ReportUnavailable, None, Some(reason)),
    };

    let message = status_message(status, target, &notes, reason.as_deref());
    info!("Run finished: {}", status);

    RunOutcome {
        status,
        broken_links_found,
        message,
        report,
        stored,
        notes,
        failed_pages: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{RetryPolicy, SkipPatterns};
    use crate::error::{FetchError, ProbeError};
    use crate::model::{LinkState, LinkStatus};
    use crate::report::FsReportStore;
    use crate::run::messages::{BROKEN_BODY, CLEAN_BODY, PARTIAL_NOTE, TRUNCATED_NOTE};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    struct FakeSite(HashMap<String, Result<String, u64>>);

    impl FakeSite {
        fn page(url: &str, html: &str) -> Self {
            Self(HashMap::from([(url.to_string(), Ok(html.to_string()))]))
        }

        fn timing_out(url: &str) -> Self {
            Self(HashMap::from([(url.to_string(), Err(15))]))
        }

        fn with(mut self, url: &str, html: &str) -> Self {
            self.0.insert(url.to_string(), Ok(html.to_string()));
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            match self.0.get(url.as_str()) {
                Some(Ok(html)) => Ok(html.clone()),
                Some(Err(secs)) => Err(FetchError::Timeout(*secs)),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    struct FixedProbe(HashMap<String, u16>);

    #[async_trait]
    impl LinkProbe for FixedProbe {
        async fn probe(&self, url: &str) -> Result<u16, ProbeError> {
            self.0
                .get(url)
                .copied()
                .ok_or_else(|| ProbeError::Transient("Connection failed".into()))
        }
    }

    // Answers known URLs at once and never answers the rest
    struct StallingProbe(HashMap<String, u16>);

    #[async_trait]
    impl LinkProbe for StallingProbe {
        async fn probe(&self, url: &str) -> Result<u16, ProbeError> {
            match self.0.get(url) {
                Some(code) => Ok(*code),
                None => std::future::pending().await,
            }
        }
    }

    // Records what it was asked to store
    #[derive(Default)]
    struct MemoryStore {
        stored: Mutex<Vec<Report>>,
        fail: bool,
    }

    impl ReportStore for MemoryStore {
        fn store(&self, report: &Report) -> StoreOutcome {
            if self.fail {
                return StoreOutcome::Missing {
                    reason: "disk full".into(),
                };
            }
            self.stored.lock().unwrap().push(report.clone());
            StoreOutcome::Written(StoredReport {
                all: PathBuf::from(report.file_name()),
                broken: PathBuf::from(report.broken_file_name()),
            })
        }
    }

    const SEED: &str = "https://site.test/";
    const SEED_HTML: &str = r#"
        <a href="https://ok.test/page">ok</a>
        <a href="https://broken.test/page">broken</a>
        <a href="https://img.test/pic.png">image</a>
    "#;

    fn config() -> RunConfig {
        let mut config = RunConfig::new();
        config.crawl.delay = Duration::ZERO;
        config.validator.retry = RetryPolicy::immediate(2);
        config.skip = SkipPatterns::new([r"\.png$"]).unwrap();
        config
    }

    fn ctx() -> RunContext {
        RunContext::new(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap())
    }

    fn probe(answers: &[(&str, u16)]) -> FixedProbe {
        FixedProbe(answers.iter().map(|(u, c)| (u.to_string(), *c)).collect())
    }

    fn seeds() -> Vec<Url> {
        vec![Url::parse(SEED).unwrap()]
    }

    #[tokio::test]
    async fn test_broken_links_scenario() {
        let site = FakeSite::page(SEED, SEED_HTML);
        let probe = probe(&[("https://ok.test/page", 200), ("https://broken.test/page", 404)]);
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };

        let outcome = run(&seeds(), &config(), &ctx(), &pipeline).await;

        let rows: Vec<(&str, LinkState, LinkStatus)> = outcome
            .report
            .records
            .iter()
            .map(|r| (r.url.as_str(), r.state, r.status))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("https://ok.test/page", LinkState::Ok, LinkStatus::Http(200)),
                ("https://broken.test/page", LinkState::Broken, LinkStatus::Http(404)),
                ("https://img.test/pic.png", LinkState::Skipped, LinkStatus::NotChecked),
            ]
        );
        assert!(outcome.broken_links_found);
        assert_eq!(outcome.status, RunStatus::BrokenLinks);
        assert_eq!(outcome.message.body, BROKEN_BODY);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(store.stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clean_scenario() {
        let site = FakeSite::page(SEED, r#"<a href="https://a.test/">a</a><a href="https://b.test/">b</a>"#);
        let probe = probe(&[("https://a.test/", 200), ("https://b.test/", 200)]);
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };

        let outcome = run(&seeds(), &config(), &ctx(), &pipeline).await;

        assert!(!outcome.broken_links_found);
        assert_eq!(outcome.status, RunStatus::Clean);
        assert_eq!(outcome.message.body, CLEAN_BODY);
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_seed_timeout_is_degraded_but_notifiable() {
        let site = FakeSite::timing_out(SEED);
        let probe = probe(&[]);
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };

        let outcome = run(&seeds(), &config(), &ctx(), &pipeline).await;

        assert!(outcome.report.is_degraded());
        assert!(outcome.report.records.is_empty());
        assert_eq!(outcome.status, RunStatus::ReportUnavailable);
        assert!(outcome.message.subject.starts_with("Link report unavailable"));
        assert!(outcome.message.body.contains("timed out"));
        assert!(store.stored.lock().unwrap().is_empty());

        let notification = outcome.notification(&["team@site.test".to_string()]);
        assert_eq!(notification.attachment, None);
        assert_eq!(notification.recipients, vec!["team@site.test"]);
        assert!(!notification.broken_links_found);
    }

    #[tokio::test]
    async fn test_report_write_failure_is_not_fatal() {
        let site = FakeSite::page(SEED, SEED_HTML);
        let probe = probe(&[("https://ok.test/page", 200), ("https://broken.test/page", 404)]);
        let store = MemoryStore { fail: true, ..MemoryStore::default() };
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };

        let outcome = run(&seeds(), &config(), &ctx(), &pipeline).await;

        assert_eq!(outcome.status, RunStatus::ReportUnavailable);
        assert!(outcome.broken_links_found);
        assert!(outcome.message.body.contains("disk full"));
        assert_eq!(outcome.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_rerun_same_day_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let store = FsReportStore::new(dir.path());
        let site = FakeSite::page(SEED, SEED_HTML);
        let probe = probe(&[("https://ok.test/page", 200), ("https://broken.test/page", 404)]);
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };

        let first = run(&seeds(), &config(), &ctx(), &pipeline).await;
        let first_all = std::fs::read(first.report_path().unwrap()).unwrap();
        let first_broken = std::fs::read(&first.stored.as_ref().unwrap().broken).unwrap();

        let second = run(&seeds(), &config(), &ctx(), &pipeline).await;
        assert_eq!(first.report_path(), second.report_path());
        assert_eq!(first_all, std::fs::read(second.report_path().unwrap()).unwrap());
        assert_eq!(first_broken, std::fs::read(&second.stored.as_ref().unwrap().broken).unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_link_is_network_failure() {
        let site = FakeSite::page(SEED, r#"<a href="https://gone.test/">gone</a>"#);
        let probe = probe(&[]);
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };

        let outcome = run(&seeds(), &config(), &ctx(), &pipeline).await;

        let record = &outcome.report.records[0];
        assert_eq!(record.status, LinkStatus::NetworkFailure);
        assert_eq!(record.failure_details.as_ref().unwrap().attempts, Some(2));
        assert_eq!(outcome.status, RunStatus::BrokenLinks);
    }

    #[tokio::test]
    async fn test_check_from_links_file_records() {
        let probe = probe(&[("https://a.test/", 200)]);
        let site = FakeSite(HashMap::new());
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };
        let records = vec![LinkRecord::new("https://a.test/", "")];

        let outcome = check(records, "links.csv", &config(), &ctx(), &pipeline).await;

        assert_eq!(outcome.status, RunStatus::Clean);
        assert_eq!(outcome.message.subject, "No broken links on links.csv");
    }

    #[tokio::test]
    async fn test_cancelled_before_any_check_is_not_clean() {
        let site = FakeSite(HashMap::new());
        let probe = probe(&[("https://ok.test/page", 200)]);
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };
        let ctx = ctx();
        ctx.cancel.cancel();

        let records = vec![
            LinkRecord::new("https://ok.test/page", SEED),
            LinkRecord::new("https://img.test/pic.png", SEED),
        ];
        let outcome = check(records, SEED, &config(), &ctx, &pipeline).await;

        assert!(outcome.report.partial);
        assert_eq!(outcome.report.counts().checked(), 0);
        assert_eq!(outcome.status, RunStatus::ReportUnavailable);
        assert!(outcome.message.subject.starts_with("Link report unavailable"));
        assert!(outcome.message.body.contains(NOTHING_CHECKED));
        assert_eq!(outcome.exit_code(), 2);
        assert!(store.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_during_hanging_checks_is_not_clean() {
        let site = FakeSite::page(SEED, r#"<a href="https://slow.test/">slow</a>"#);
        let probe = StallingProbe(HashMap::new());
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };
        let ctx = ctx();

        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
        let outcome = run(&seeds(), &config(), &ctx, &pipeline).await;

        assert!(outcome.report.records.is_empty());
        assert_eq!(outcome.status, RunStatus::ReportUnavailable);
        assert_eq!(outcome.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_mid_check_reports_what_was_checked() {
        let site = FakeSite(HashMap::new());
        let probe = StallingProbe(HashMap::from([("https://ok.test/page".to_string(), 200)]));
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };
        let ctx = ctx();

        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
        let records = vec![
            LinkRecord::new("https://ok.test/page", SEED),
            LinkRecord::new("https://slow.test/", SEED),
        ];
        let outcome = check(records, SEED, &config(), &ctx, &pipeline).await;

        assert!(outcome.report.partial);
        assert_eq!(outcome.report.records.len(), 1);
        assert_eq!(outcome.status, RunStatus::Clean);
        assert_eq!(outcome.message.body, format!("{}{}", CLEAN_BODY, PARTIAL_NOTE));
        assert_eq!(store.stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_inner_page_is_noted() {
        let site = FakeSite::page(SEED, r#"<a href="/missing">m</a><a href="https://ok.test/page">ok</a>"#);
        let probe = probe(&[("https://site.test/missing", 200), ("https://ok.test/page", 200)]);
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };
        let mut config = config();
        config.crawl.recurse = true;

        let outcome = run(&seeds(), &config, &ctx(), &pipeline).await;

        assert_eq!(outcome.status, RunStatus::Clean);
        assert_eq!(outcome.failed_pages.len(), 1);
        assert_eq!(outcome.notes.failed_pages, 1);
        assert!(outcome
            .message
            .body
            .ends_with(" Note: 1 page(s) could not be crawled, so links on them were not checked."));
    }

    #[tokio::test]
    async fn test_page_ceiling_is_noted() {
        let site = FakeSite::page(SEED, r#"<a href="/next">next</a>"#).with("https://site.test/next", "");
        let probe = probe(&[("https://site.test/next", 200)]);
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };
        let mut config = config();
        config.crawl.recurse = true;
        config.crawl.max_pages = 1;

        let outcome = run(&seeds(), &config, &ctx(), &pipeline).await;

        assert!(outcome.notes.truncated);
        assert!(!outcome.report.partial);
        assert_eq!(outcome.status, RunStatus::Clean);
        assert_eq!(outcome.message.body, format!("{}{}", CLEAN_BODY, TRUNCATED_NOTE));
    }

    #[tokio::test]
    async fn test_several_seeds_share_one_report() {
        let site = FakeSite::page("https://site.test/?a=a", r#"<a href="https://ok.test/page">ok</a>"#)
            .with("https://site.test/?a=b", r#"<a href="https://broken.test/page">broken</a>"#);
        let probe = probe(&[("https://ok.test/page", 200), ("https://broken.test/page", 404)]);
        let store = MemoryStore::default();
        let pipeline = Pipeline { fetcher: &site, probe: &probe, store: &store };
        let seeds = vec![
            Url::parse("https://site.test/?a=a").unwrap(),
            Url::parse("https://site.test/?a=b").unwrap(),
        ];

        let outcome = run(&seeds, &config(), &ctx(), &pipeline).await;

        let urls: Vec<&str> = outcome.report.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://ok.test/page", "https://broken.test/page"]);
        assert_eq!(outcome.status, RunStatus::BrokenLinks);
        assert_eq!(
            outcome.message.subject,
            "Broken links detected on https://site.test/?a=a and 1 other page(s)"
        );
        assert_eq!(store.stored.lock().unwrap().len(), 1);
    }
}
