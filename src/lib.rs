//! OpenQuake: an incremental scraper for PHIVOLCS earthquake bulletins
//!
//! This crate discovers the earthquake records listed for a month, remembers
//! which records were already scraped, fetches the remaining detail pages
//! concurrently and writes the extracted events to Parquet files.

pub mod config;
pub mod crawler;
pub mod links;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for OpenQuake operations
#[derive(Debug, Error)]
pub enum QuakeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch listing page: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Listing page error: {0}")]
    Extraction(#[from] crawler::ExtractionError),

    #[error("State error: {0}")]
    State(#[from] state::StateError),

    #[error("Object storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Empty link")]
    Empty,
}

/// Result type alias for OpenQuake operations
pub type Result<T> = std::result::Result<T, QuakeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, RunOutcome};
pub use output::RunSummary;
pub use state::{commit_results, reconcile, EarthquakeEvent, Reconciliation, Target};
