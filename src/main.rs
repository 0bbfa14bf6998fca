//! OpenQuake main entry point
//!
//! This is the command-line interface for the OpenQuake bulletin scraper.

use anyhow::Context;
use clap::Parser;
use openquake::config::{load_config_with_hash, Config};
use openquake::crawler::Coordinator;
use openquake::output::{load_statistics, print_statistics};
use openquake::state::StateStore;
use openquake::storage::open_object_store;
use openquake::RunOutcome;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code when every listed record was already scraped
const EXIT_NOTHING_TO_SCRAPE: u8 = 3;

/// OpenQuake: an incremental PHIVOLCS earthquake bulletin scraper
///
/// OpenQuake reads the monthly earthquake listing, remembers which records
/// were already scraped, fetches the remaining bulletins concurrently and
/// writes the extracted events to Parquet.
#[derive(Parser, Debug)]
#[command(name = "openquake")]
#[command(version)]
#[command(about = "An incremental PHIVOLCS earthquake bulletin scraper", long_about = None)]
struct Cli {
    /// Monthly listing page to scrape (defaults to the configured period)
    #[arg(value_name = "PERIOD_URL")]
    period_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Fetch the listing and show what would be scraped without scraping or writing output
    ///
    /// With a [remote] store configured, the local state file is refreshed from it.
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the saved state of a period (e.g. "January 2023") and exit
    #[arg(long, value_name = "PERIOD", conflicts_with = "dry_run")]
    stats: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = if cli.dry_run {
        handle_dry_run(config, cli.period_url.as_deref()).await
    } else if let Some(period) = &cli.stats {
        handle_stats(&config, period).await
    } else {
        handle_scrape(config, cli.period_url.as_deref(), !cli.quiet).await
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Loads the configuration file, or the defaults when none was given
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let Some(path) = &cli.config else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("reading {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("openquake=info,warn"),
            1 => EnvFilter::new("openquake=debug,info"),
            2 => EnvFilter::new("openquake=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: reconciles the listing without scraping
///
/// Only the remote state download (when configured) touches the disk.
async fn handle_dry_run(config: Config, period_url: Option<&str>) -> anyhow::Result<ExitCode> {
    let listing_url = config.scraper.listing_url(period_url).to_string();
    let concurrency = config.scraper.concurrency();

    let coordinator = Coordinator::new(config)
        .await
        .context("setting up the scraper")?
        .with_progress(false);
    let plan = coordinator
        .plan(&listing_url)
        .await
        .with_context(|| format!("reading listing {}", listing_url))?;

    println!("=== OpenQuake Dry Run ===\n");
    println!("Listing: {}", listing_url);
    println!("Period: {}", plan.period);
    println!("Known targets: {}", plan.merged.len() - plan.new_items);
    println!("New targets: {}", plan.new_items);
    println!("Would scrape {} targets with {} workers", plan.pending.len(), concurrency);
    for target in &plan.pending {
        println!("  - {}", target);
    }

    if plan.is_empty() {
        return Ok(ExitCode::from(EXIT_NOTHING_TO_SCRAPE));
    }
    Ok(ExitCode::SUCCESS)
}

/// Handles the --stats mode: shows the saved state of a period
async fn handle_stats(config: &Config, period: &str) -> anyhow::Result<ExitCode> {
    let mut store = StateStore::new(&config.output.state_dir);
    if let Some(remote_config) = &config.remote {
        let remote = open_object_store(remote_config)
            .await
            .context("opening the remote store")?;
        store = store.with_remote(remote, remote_config.state_prefix.clone());
    }

    println!("State: {}\n", store.path_for(period).display());

    let stats = load_statistics(&store, &config.output.output_dir, period)
        .await
        .with_context(|| format!("loading state for {}", period))?;
    print_statistics(&stats);

    Ok(ExitCode::SUCCESS)
}

/// Handles the main scrape operation
async fn handle_scrape(
    config: Config,
    period_url: Option<&str>,
    show_progress: bool,
) -> anyhow::Result<ExitCode> {
    let listing_url = config.scraper.listing_url(period_url).to_string();

    let coordinator = Coordinator::new(config)
        .await
        .context("setting up the scraper")?
        .with_progress(show_progress);

    match coordinator.run(&listing_url).await? {
        RunOutcome::Completed(summary) => {
            if let Some(output) = &summary.output {
                tracing::info!("Events written to {}", output.display());
            }
            println!("{}", summary.message());
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::NothingToScrape { period } => {
            tracing::info!("Nothing to scrape for {}", period);
            Ok(ExitCode::from(EXIT_NOTHING_TO_SCRAPE))
        }
    }
}
