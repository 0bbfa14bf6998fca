//! Concurrent fetch of pending detail pages
//!
//! Every pending target is an independent unit of work: fetch, then parse.
//! Units run on the tokio runtime under a semaphore that bounds how many are
//! in flight. Each unit returns its own result; the orchestrator merges them
//! after the set drains, so no state is shared between units.

use crate::crawler::detail::{extract_event, ParseError};
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher};
use crate::state::{EarthquakeEvent, Target};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Why one target produced no event
#[derive(Debug, Clone)]
pub enum FailureReason {
    Fetch(FetchError),
    Parse(ParseError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed: {}", e),
            Self::Parse(e) => write!(f, "parse failed: {}", e),
        }
    }
}

/// A target that failed in this run and stays unscraped
#[derive(Debug, Clone)]
pub struct TargetFailure {
    pub url: String,
    pub reason: FailureReason,
}

/// Everything produced by one orchestrator run
#[derive(Debug, Default)]
pub struct Harvest {
    /// Extracted events, in completion order
    pub events: Vec<EarthquakeEvent>,

    /// URLs whose detail page was fetched and parsed
    pub succeeded_urls: HashSet<String>,

    /// Targets that failed to fetch or parse
    pub failures: Vec<TargetFailure>,

    /// Units that panicked; their URLs are unknown and stay unscraped
    pub panicked: usize,
}

impl Harvest {
    /// Number of units that did not produce an event
    pub fn failed(&self) -> usize {
        self.failures.len() + self.panicked
    }
}

/// Runs detail fetch + extraction over the pending set
#[derive(Debug, Clone)]
pub struct Orchestrator {
    fetcher: Fetcher,
    concurrency: usize,
}

impl Orchestrator {
    /// Creates an orchestrator running at most `concurrency` units at once
    pub fn new(fetcher: Fetcher, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetches and parses every pending target
    ///
    /// A failure of one target never aborts or delays the others. The
    /// progress bar advances once per finished unit, success or not. All
    /// dispatched units complete before this returns.
    pub async fn run(&self, pending: &[Target], progress: &ProgressBar) -> Harvest {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for target in pending {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = self.fetcher.clone();
            let url = target.url.clone();

            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = scrape_target(&fetcher, &url).await;
                (url, outcome)
            });
        }

        let mut harvest = Harvest::default();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((url, Ok(event))) => {
                    harvest.events.push(event);
                    harvest.succeeded_urls.insert(url);
                }
                Ok((url, Err(reason))) => {
                    tracing::warn!("Scraping {} failed: {}", url, reason);
                    harvest.failures.push(TargetFailure { url, reason });
                }
                Err(e) => {
                    tracing::error!("Scrape task did not complete: {}", e);
                    harvest.panicked += 1;
                }
            }
            progress.inc(1);
        }

        tracing::debug!(
            "Orchestrator finished: {} succeeded, {} failed",
            harvest.succeeded_urls.len(),
            harvest.failed()
        );

        harvest
    }
}

/// Fetches one detail page and extracts its event
async fn scrape_target(fetcher: &Fetcher, url: &str) -> Result<EarthquakeEvent, FailureReason> {
    let page = fetcher.fetch(url).await.map_err(FailureReason::Fetch)?;
    parse_detail(&page).map_err(FailureReason::Parse)
}

/// Parses after the fetch completed; the document never crosses an await
fn parse_detail(page: &FetchedPage) -> Result<EarthquakeEvent, ParseError> {
    let document = page.document();
    extract_event(&document)
}
