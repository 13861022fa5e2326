// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Wire the real collaborators (HTTP client, browser, report directory)
// 3. Dispatch to the subcommand handler
// 4. Print results, hand the outcome to the notifier
// 5. Exit with proper code (0 = clean, 1 = broken links, 2 = no report / error)
//
// Ctrl-C and the optional --deadline both cancel the run; whatever was
// checked by then still ends up in a (partial) report; a run cancelled before
// any link was checked gets no report at all.
// =============================================================================

mod checker; // src/checker/ - link extraction, probing and validation
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - defaults and RunConfig
mod context; // src/context.rs - run date and cancellation
mod crawl; // src/crawl/ - page fetching and the BFS collector
mod error; // src/error.rs - error enums
mod logging; // src/logging.rs - env_logger setup
mod model; // src/model.rs - records and results
mod report; // src/report/ - report building and CSV files
mod run; // src/run/ - orchestration and notification

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use checker::{build_client, HttpProbe, SkipPatterns};
use cli::{CheckArgs, Cli, Commands, CommonArgs, CrawlArgs};
use context::RunContext;
use crawl::{BrowserFetcher, HttpFetcher, PageFetcher};
use model::ValidationResult;
use report::{read_links, FsReportStore};
use run::{ConsoleNotifier, GithubActionsNotifier, Notifier, Pipeline, RunOutcome};

#[tokio::main]
async fn main() {
    let exit_code = match dispatch().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn dispatch() -> Result<i32> {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logger(cli.log_level) {
        eprintln!("Warning: logger already initialised: {}", e);
    }

    match cli.command {
        Commands::Run {
            seed_urls,
            crawl,
            check,
            common,
        } => handle_run(&seed_urls, &crawl, &check, &common).await,
        Commands::Collect {
            seed_urls,
            crawl,
            common,
        } => handle_collect(&seed_urls, &crawl, &common).await,
        Commands::Check {
            links_file,
            check,
            common,
        } => handle_check(links_file, &check, &common).await,
    }
}

// Handles the 'run' subcommand: collect, check, report, notify
async fn handle_run(seed_urls: &[String], crawl: &CrawlArgs, check: &CheckArgs, common: &CommonArgs) -> Result<i32> {
    let seeds = cli::parse_seeds(seed_urls)?;
    let config = cli::run_config(Some(crawl), check, common)?;
    let ctx = RunContext::today();
    spawn_cancel_triggers(&ctx, check.deadline);

    println!("🔍 Scanning website: {}", run::target_label(&seeds));

    let client = build_client(common.timeout()).context("Failed to create HTTP client")?;
    let probe = HttpProbe::new(client.clone());
    let store = FsReportStore::new(&config.reports_dir);
    let http = HttpFetcher::new(client);
    log_settings(&config.skip, &store);
    let browser = launch_browser_if(crawl.render, common.timeout()).await?;

    let fetcher: &dyn PageFetcher = match &browser {
        Some(browser) => browser,
        None => &http,
    };
    let pipeline = Pipeline {
        fetcher,
        probe: &probe,
        store: &store,
    };
    let outcome = run::run(&seeds, &config, &ctx, &pipeline).await;

    if let Some(browser) = browser {
        browser.close().await;
    }

    for failure in &outcome.failed_pages {
        warn!("Could not crawl {}: {}", failure.url, failure.error);
    }
    if ctx.is_cancelled() {
        warn!("Run was cancelled before it completed");
    }

    finish(&outcome, &config.recipients, check.json)
}

// Handles the 'collect' subcommand: writes get-links-<date>.csv, no checking
async fn handle_collect(seed_urls: &[String], crawl: &CrawlArgs, common: &CommonArgs) -> Result<i32> {
    let seeds = cli::parse_seeds(seed_urls)?;
    let options = crawl.to_options();
    let ctx = RunContext::today();
    spawn_cancel_triggers(&ctx, None);

    println!("🔍 Collecting links from: {}", run::target_label(&seeds));

    let client = build_client(common.timeout()).context("Failed to create HTTP client")?;
    let http = HttpFetcher::new(client);
    let browser = launch_browser_if(crawl.render, common.timeout()).await?;
    let fetcher: &dyn PageFetcher = match &browser {
        Some(browser) => browser,
        None => &http,
    };

    let collection = crawl::collect_from_seeds(&seeds, &options, fetcher, &ctx).await;

    if let Some(browser) = browser {
        browser.close().await;
    }

    let collection = collection.context("Link collection failed")?;
    for failure in &collection.failed_pages {
        warn!("Could not crawl {}: {}", failure.url, failure.error);
    }
    if collection.truncated {
        warn!("Crawl stopped at its page limit; the links file is incomplete");
    }
    if collection.cancelled {
        warn!("Crawl was cancelled; the links file is incomplete");
    }

    let store = FsReportStore::new(&common.reports_dir);
    let path = store
        .write_links(&collection.records, ctx.date)
        .context("Failed to write links file")?;

    println!(
        "📄 Crawled {} page(s), {} link(s) written to {}",
        collection.pages_visited,
        collection.records.len(),
        path.display()
    );
    Ok(0)
}

// Handles the 'check' subcommand: validates a links file from 'collect'
async fn handle_check(links_file: Option<PathBuf>, check: &CheckArgs, common: &CommonArgs) -> Result<i32> {
    let config = cli::run_config(None, check, common)?;
    let ctx = RunContext::today();
    let store = FsReportStore::new(&config.reports_dir);

    // Without LINKS_FILE, pick up what last week's collection wrote
    let links_file = links_file.unwrap_or_else(|| store.previous_links_path(ctx.date));
    let file = File::open(&links_file).with_context(|| format!("Failed to open {}", links_file.display()))?;
    let records = read_links(file).with_context(|| format!("Failed to read {}", links_file.display()))?;
    info!("Loaded {} link(s) from {}", records.len(), links_file.display());

    spawn_cancel_triggers(&ctx, check.deadline);

    let client = build_client(common.timeout()).context("Failed to create HTTP client")?;
    let probe = HttpProbe::new(client.clone());
    let http = HttpFetcher::new(client);
    log_settings(&config.skip, &store);
    let pipeline = Pipeline {
        fetcher: &http,
        probe: &probe,
        store: &store,
    };

    let target = links_file.display().to_string();
    let outcome = run::check(records, &target, &config, &ctx, &pipeline).await;
    finish(&outcome, &config.recipients, check.json)
}

fn log_settings(skip: &SkipPatterns, store: &FsReportStore) {
    if skip.is_empty() {
        info!("No skip patterns; every link is checked");
    } else {
        info!("{} skip pattern(s)", skip.len());
    }
    info!("Reports go to {}", store.dir().display());
}

async fn launch_browser_if(render: bool, timeout: Duration) -> Result<Option<BrowserFetcher>> {
    if !render {
        return Ok(None);
    }
    info!("Launching headless browser");
    let browser = BrowserFetcher::launch(timeout)
        .await
        .context("Failed to launch headless browser (is Chrome installed?)")?;
    Ok(Some(browser))
}

// Cancels the run on Ctrl-C or when the deadline passes
fn spawn_cancel_triggers(ctx: &RunContext, deadline: Option<u64>) {
    let cancel = ctx.cancel.clone();

    tokio::spawn(async move {
        let deadline_reached = async {
            match deadline {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => warn!("Interrupted; finishing with the links checked so far"),
            _ = deadline_reached => warn!("Run deadline reached; finishing with the links checked so far"),
            _ = cancel.cancelled() => return,
        }
        cancel.cancel();
    });
}

fn finish(outcome: &RunOutcome, recipients: &[String], json: bool) -> Result<i32> {
    print_results(&outcome.report.records, json)?;

    if !json {
        print_summary(outcome);
    }

    let notification = outcome.notification(recipients);
    let notified = match GithubActionsNotifier::from_env() {
        Some(notifier) => notifier.notify(&notification),
        // stdout carries the JSON document in --json mode
        None if json => Ok(()),
        None => ConsoleNotifier.notify(&notification),
    };
    if let Err(e) = notified {
        error!("Failed to publish run outcome: {}", e);
    }

    Ok(outcome.exit_code())
}

// Prints the results either as a table or JSON
fn print_results(results: &[ValidationResult], json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(results)?;
        println!("{}", json_output);
    } else {
        print_table(results);
    }
    Ok(())
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let head: String = value.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}

// Prints results as a human-readable table in the terminal
fn print_table(results: &[ValidationResult]) {
    println!("{:<60} {:<12} {:<8} {:<40}", "URL", "STATE", "STATUS", "PARENT");
    println!("{}", "=".repeat(123));

    for result in results {
        println!(
            "{:<60} {:<12} {:<8} {:<40}",
            truncate(&result.url, 60),
            format_state(result),
            result.status.report_value(),
            truncate(&result.parent, 40)
        );
    }

    println!();
}

fn print_summary(outcome: &RunOutcome) {
    let counts = outcome.report.counts();

    println!("📊 Summary:");
    println!("   ✅ OK: {}", counts.ok);
    println!("   ❌ Broken: {}", counts.broken);
    println!("   ⏭️  Skipped: {}", counts.skipped);
    println!("   📋 Total: {}", counts.total());

    if outcome.report.partial {
        println!("   ⚠️  Run was cancelled; not every link was checked");
    }
    match outcome.report_path() {
        Some(path) => println!("   📄 Report: {}", path.display()),
        None => println!("   ⚠️  No report was generated"),
    }
}

fn format_state(result: &ValidationResult) -> String {
    match result.state {
        model::LinkState::Ok => "✅ OK".to_string(),
        model::LinkState::Broken => "❌ BROKEN".to_string(),
        model::LinkState::Skipped => "⏭️  SKIPPED".to_string(),
    }
}
