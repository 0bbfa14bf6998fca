//! Result sink trait and error types
//!
//! This module defines the trait interface for result sinks, which receive
//! the events extracted in a run once the concurrent phase is over.

use crate::state::EarthquakeEvent;
use crate::storage::StorageError;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to upload output: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives the events of a run
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persists the events extracted for `period`
    ///
    /// An empty slice is a no-op and returns `Ok(None)`; no empty file is
    /// ever produced. Otherwise returns the path of the written file.
    async fn finalize(
        &self,
        period: &str,
        events: &[EarthquakeEvent],
    ) -> OutputResult<Option<PathBuf>>;
}
