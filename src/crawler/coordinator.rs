//! Run coordinator - one incremental scrape of a period
//!
//! This module drives a complete run:
//! - Fetching and parsing the listing page
//! - Reconciling the listing with the saved period state
//! - Persisting the merged state before any detail page is fetched
//! - Running the orchestrator over the pending targets
//! - Writing the extracted events, then committing the successes

use crate::config::Config;
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::listing::{extract_targets, ExtractionError};
use crate::crawler::orchestrator::Orchestrator;
use crate::crawler::progress::progress_bar;
use crate::output::{ParquetSink, ResultSink, RunSummary};
use crate::state::{commit_results, reconcile, Reconciliation, StateStore, Target};
use crate::storage::open_object_store;
use crate::{QuakeError, UrlError};
use std::sync::Arc;
use url::Url;

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The pending targets were processed and the state committed
    Completed(RunSummary),

    /// Every listed target was already scraped; nothing was written
    NothingToScrape { period: String },
}

/// Main run coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Fetcher,
    base_url: Url,
    store: StateStore,
    sink: Arc<dyn ResultSink>,
    show_progress: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Builds the HTTP client and, when a `[remote]` section is configured,
    /// connects the object store used by both the state store and the sink.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(QuakeError)` - The client or the object store could not be set up
    pub async fn new(config: Config) -> Result<Self, QuakeError> {
        let fetcher = Fetcher::new(&config.scraper)?;
        let base_url = Url::parse(&config.scraper.base_url)
            .map_err(|e| UrlError::Parse(format!("{}: {}", config.scraper.base_url, e)))?;

        let mut store = StateStore::new(&config.output.state_dir);
        let mut sink = ParquetSink::new(&config.output.output_dir);

        if let Some(remote_config) = &config.remote {
            let remote = open_object_store(remote_config).await?;
            tracing::info!("Syncing state and output with {}", remote.location());
            store = store.with_remote(Arc::clone(&remote), remote_config.state_prefix.clone());
            sink = sink.with_remote(remote, remote_config.output_prefix.clone());
        }

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            base_url,
            store,
            sink: Arc::new(sink),
            show_progress: true,
        })
    }

    /// Replaces the result sink
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Shows or hides the progress bar during the fetch phase
    pub fn with_progress(mut self, visible: bool) -> Self {
        self.show_progress = visible;
        self
    }

    pub fn state_store(&self) -> &StateStore {
        &self.store
    }

    /// Fetches the listing and reconciles it with the saved state
    ///
    /// No state or output is written. When a remote store is attached, its
    /// copy of the period state replaces the local file first. A listing that
    /// cannot be fetched or parsed is fatal for the run.
    pub async fn plan(&self, listing_url: &str) -> Result<Reconciliation, QuakeError> {
        tracing::info!("Fetching listing {}", listing_url);
        let page = self.fetcher.fetch(listing_url).await?;
        let (period, discovered) = parse_listing(&page, &self.base_url)?;
        tracing::info!("Found {} records for {}", discovered.len(), period);

        let previous = self.store.load(&period).await?;
        if !previous.is_empty() {
            tracing::info!(
                "Loaded {} saved targets for {} from {}",
                previous.len(),
                period,
                self.store.path_for(&period).display()
            );
        }

        Ok(reconcile(&period, previous, discovered))
    }

    /// Runs one incremental scrape of the period at `listing_url`
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome::Completed)` - Pending targets processed; individual
    ///   targets may still have failed
    /// * `Ok(RunOutcome::NothingToScrape)` - No pending targets
    /// * `Err(QuakeError)` - Listing, state or output failure
    pub async fn run(&self, listing_url: &str) -> Result<RunOutcome, QuakeError> {
        let Reconciliation {
            period,
            pending,
            merged,
            new_items,
        } = self.plan(listing_url).await?;

        if pending.is_empty() {
            tracing::info!("No new data to be scraped for {}", period);
            return Ok(RunOutcome::NothingToScrape { period });
        }

        tracing::info!(
            "{} targets to scrape for {} ({} new)",
            pending.len(),
            period,
            new_items
        );

        // Record newly discovered targets before fetching anything
        self.store.save(&period, &merged).await?;

        let orchestrator = Orchestrator::new(self.fetcher.clone(), self.config.scraper.concurrency());
        let progress = progress_bar(pending.len(), self.show_progress);
        let harvest = orchestrator.run(&pending, &progress).await;
        progress.finish_and_clear();

        // Commit only after the events are stored
        let output = self.sink.finalize(&period, &harvest.events).await?;

        let committed = commit_results(&period, merged, &harvest.succeeded_urls);
        let state_path = self.store.save(&period, &committed).await?;

        Ok(RunOutcome::Completed(RunSummary {
            period,
            pending: pending.len(),
            succeeded: harvest.succeeded_urls.len(),
            failed: harvest.failed(),
            new_items,
            state_path,
            output,
        }))
    }
}

/// Parses the listing after the fetch completed
fn parse_listing(
    page: &FetchedPage,
    base_url: &Url,
) -> Result<(String, Vec<Target>), ExtractionError> {
    let document = page.document();
    extract_targets(&document, base_url)
}
