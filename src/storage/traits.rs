//! Object store trait and error types
//!
//! This module defines the trait interface for remote object stores used to
//! share period state files and Parquet output between runs.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during object store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object store backend error: {0}")]
    Backend(String),

    #[error("Object store is not configured correctly: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for object store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A bucket-like key/value store for whole files
///
/// Keys use `/` as separator regardless of the backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns true if an object exists under `key`
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Copies the object under `key` to `local_path`, replacing the file
    ///
    /// Parent directories of `local_path` are created as needed.
    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()>;

    /// Stores the file at `local_path` under `key`
    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()>;

    /// Human-readable location for log messages
    fn location(&self) -> String;
}
