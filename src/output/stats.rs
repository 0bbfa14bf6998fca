//! Run summaries and period statistics
//!
//! This module provides the summary returned by a completed run and the
//! statistics shown for a period's saved state.

use crate::state::{count_scraped, period_file_stem, StateError, StateStore};
use std::path::{Path, PathBuf};

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Period the run worked on
    pub period: String,

    /// Targets that were pending at the start of the run
    pub pending: usize,

    /// Targets whose event was extracted
    pub succeeded: usize,

    /// Targets that failed to fetch or parse
    pub failed: usize,

    /// Targets discovered for the first time in this run
    pub new_items: usize,

    /// Where the period state was written
    pub state_path: PathBuf,

    /// Parquet file written by this run, if any event was extracted
    pub output: Option<PathBuf>,
}

impl RunSummary {
    /// Closing line printed by the CLI
    pub fn message(&self) -> String {
        format!(
            "Process complete. Total {}/{} targets successfully scraped.",
            self.succeeded, self.pending
        )
    }
}

/// Statistics of a period's saved state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodStatistics {
    /// Period the statistics belong to
    pub period: String,

    /// Targets recorded in the state file
    pub total_targets: usize,

    /// Targets already scraped
    pub scraped: usize,

    /// Parquet part files found for the period
    pub output_parts: Vec<PathBuf>,
}

impl PeriodStatistics {
    /// Targets still waiting to be scraped
    pub fn unscraped(&self) -> usize {
        self.total_targets - self.scraped
    }
}

/// Loads statistics for a period from its state file and output directory
///
/// # Arguments
///
/// * `store` - The state store holding the period file
/// * `output_dir` - Directory containing the Parquet part files
/// * `period` - Period identifier (e.g. "January 2023")
pub async fn load_statistics(
    store: &StateStore,
    output_dir: &Path,
    period: &str,
) -> Result<PeriodStatistics, StateError> {
    let targets = store.load(period).await?;
    let (scraped, unscraped) = count_scraped(&targets);

    let prefix = format!("{} - p", period_file_stem(period));
    let mut output_parts: Vec<PathBuf> = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect(),
        Err(_) => Vec::new(),
    };
    output_parts.sort();

    Ok(PeriodStatistics {
        period: period.to_string(),
        total_targets: scraped + unscraped,
        scraped,
        output_parts,
    })
}

/// Prints period statistics to stdout in a formatted manner
pub fn print_statistics(stats: &PeriodStatistics) {
    println!("=== {} ===\n", stats.period);

    println!("Targets:");
    println!("  Total recorded: {}", stats.total_targets);
    let percentage = if stats.total_targets > 0 {
        (stats.scraped as f64 / stats.total_targets as f64) * 100.0
    } else {
        0.0
    };
    println!("  Scraped: {} ({:.1}%)", stats.scraped, percentage);
    println!("  Remaining: {}", stats.unscraped());
    println!();

    if !stats.output_parts.is_empty() {
        println!("Output files ({}):", stats.output_parts.len());
        for part in &stats.output_parts {
            println!("  {}", part.display());
        }
        println!();
    }
}
