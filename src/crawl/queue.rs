// src/crawl/queue.rs
// =============================================================================
// This module implements the Link Collector with a breadth-first crawl.
//
// How it works:
// 1. Start with the seed URL in a queue
// 2. Fetch the page through the configured PageFetcher
// 3. Record every link on the page as (url, parent)
// 4. When recursing, queue in-domain links not visited yet
// 5. Repeat until the queue is empty or a ceiling is reached
//
// Termination:
// - The visited set means each page is fetched at most once, so cycles
//   (A -> B -> A) end
// - max_pages (and optionally max_depth) bound the crawl on huge sites
//
// Failures:
// - Seed page unreachable: the whole collection fails
// - Any other page: logged, remembered in `failed_pages`, skipped
// =============================================================================

use log::{info, warn};
use std::collections::{HashSet, VecDeque};
use url::Url;

use super::fetch::PageFetcher;
use crate::checker::{extract_html_links, is_in_domain};
use crate::config::CrawlOptions;
use crate::context::RunContext;
use crate::error::CollectError;
use crate::model::LinkRecord;

// Represents a page in the crawl queue
#[derive(Debug, Clone)]
struct CrawlItem {
    url: Url,
    depth: usize, // Link hops from the seed (seed = 0)
}

/// A page that could not be fetched during a recursive crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub url: String,
    pub error: String,
}

/// The Collector's output.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Unique (url, parent) pairs in discovery order
    pub records: Vec<LinkRecord>,
    pub pages_visited: usize,
    pub failed_pages: Vec<PageFailure>,
    /// The crawl stopped at its page ceiling with pages still queued
    pub truncated: bool,
    /// The run was cancelled with pages still queued
    pub cancelled: bool,
}

impl Collection {
    // Appends another seed's collection, keeping (url, parent) pairs unique
    fn absorb(&mut self, other: Collection, seen: &mut HashSet<(String, String)>) {
        for record in other.records {
            if seen.insert((record.url.clone(), record.parent.clone())) {
                self.records.push(record);
            }
        }
        self.pages_visited += other.pages_visited;
        self.failed_pages.extend(other.failed_pages);
        self.truncated |= other.truncated;
        self.cancelled |= other.cancelled;
    }
}

// Pages differing only by fragment are the same page
fn page_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.to_string()
}

/// Collects links starting from `seed`.
///
/// With `options.recurse == false` only the seed page is read.
pub async fn collect_links(
    seed: &Url,
    options: &CrawlOptions,
    fetcher: &dyn PageFetcher,
    ctx: &RunContext,
) -> Result<Collection, CollectError> {
    let seed_host = seed.host_str().map(str::to_owned);
    let max_pages = options.max_pages.max(1);

    let mut queue = VecDeque::new();
    queue.push_back(CrawlItem {
        url: seed.clone(),
        depth: 0,
    });

    let mut visited = HashSet::new();
    visited.insert(page_key(seed));

    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
    let mut collection = Collection::default();

    while let Some(item) = queue.pop_front() {
        if collection.pages_visited >= max_pages {
            warn!("Reached the {} page ceiling; {} page(s) not crawled", max_pages, queue.len() + 1);
            collection.truncated = true;
            break;
        }

        let fetched = tokio::select! {
            _ = ctx.cancel.cancelled() => None,
            fetched = fetcher.fetch(&item.url) => Some(fetched),
        };

        let html = match fetched {
            None if item.depth == 0 => return Err(CollectError::Cancelled),
            None => {
                warn!("Crawl cancelled; {} page(s) not crawled", queue.len() + 1);
                collection.cancelled = true;
                break;
            }
            Some(Ok(html)) => html,
            Some(Err(source)) if item.depth == 0 => {
                return Err(CollectError::SeedUnreachable {
                    url: item.url.to_string(),
                    source,
                });
            }
            Some(Err(e)) => {
                warn!("Failed to fetch {}: {}", item.url, e);
                collection.failed_pages.push(PageFailure {
                    url: item.url.to_string(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        collection.pages_visited += 1;
        let parent = item.url.to_string();
        let links = extract_html_links(&html, &item.url);
        info!("Crawled [depth {}] {}: {} link(s)", item.depth, item.url, links.len());

        let follow = options.recurse && options.max_depth.map_or(true, |max| item.depth < max);

        for link in links {
            if seen_pairs.insert((link.to_string(), parent.clone())) {
                collection.records.push(LinkRecord::new(link.as_str(), parent.as_str()));
            }

            if follow && is_in_domain(&link, seed_host.as_deref()) && visited.insert(page_key(&link)) {
                queue.push_back(CrawlItem {
                    url: link,
                    depth: item.depth + 1,
                });
            }
        }

        // Polite crawling: small delay between requests
        if !queue.is_empty() && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    info!(
        "Collected {} link(s) from {} page(s) ({} failed)",
        collection.records.len(),
        collection.pages_visited,
        collection.failed_pages.len()
    );
    Ok(collection)
}

/// Collects links from several seed pages into one list.
///
/// Seeds are crawled in order and their records concatenated, keeping the
/// first occurrence of each (url, parent) pair. An unreachable seed is only
/// terminal when no seed could be read at all; otherwise it is recorded in
/// `failed_pages` like any other page.
pub async fn collect_from_seeds(
    seeds: &[Url],
    options: &CrawlOptions,
    fetcher: &dyn PageFetcher,
    ctx: &RunContext,
) -> Result<Collection, CollectError> {
    let mut merged = Collection::default();
    let mut seen = HashSet::new();
    let mut reached_any = false;
    let mut last_error = None;

    for seed in seeds {
        if ctx.is_cancelled() {
            merged.cancelled = true;
            break;
        }

        match collect_links(seed, options, fetcher, ctx).await {
            Ok(collection) => {
                reached_any = true;
                merged.absorb(collection, &mut seen);
                if merged.cancelled {
                    break;
                }
            }
            Err(CollectError::Cancelled) => {
                merged.cancelled = true;
                break;
            }
            Err(e) => {
                warn!("{}", e);
                merged.failed_pages.push(PageFailure {
                    url: seed.to_string(),
                    error: e.to_string(),
                });
                last_error = Some(e);
            }
        }
    }

    if !reached_any && !seeds.is_empty() {
        return Err(match last_error {
            Some(e) if !merged.cancelled => e,
            _ => CollectError::Cancelled,
        });
    }
    Ok(merged)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why mark pages visited when queueing, not when fetching?
//    - A page linked from ten pages would otherwise sit in the queue ten times
//    - The queue then never holds duplicates, so its length is a real
//      "pages left" count
//
// 2. Why no lock around `visited`?
//    - Each fetch depends on links found by the previous one, so the crawl
//      is sequential; only the validator runs requests concurrently
// -----------------------------------------------------------------------------
