//! Persistence of period state files
//!
//! Each period is stored as a JSON array of targets at
//! `<state_dir>/<period>.json`. When an object store is attached, the remote
//! copy is pulled before reading and pushed after every write.

use crate::config::object_key;
use crate::state::Target;
use crate::storage::{ObjectStore, StorageError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;

/// Errors that can occur while reading or writing period state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed state file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to sync state file: {0}")]
    Storage(#[from] StorageError),
}

/// Reads and writes period state files, optionally mirrored remotely
#[derive(Clone)]
pub struct StateStore {
    state_dir: PathBuf,
    remote: Option<Arc<dyn ObjectStore>>,
    prefix: String,
}

impl StateStore {
    /// Creates a store writing to `state_dir` only
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            remote: None,
            prefix: String::new(),
        }
    }

    /// Mirrors state files to `remote` under `prefix`
    pub fn with_remote(mut self, remote: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        self.remote = Some(remote);
        self.prefix = prefix.into();
        self
    }

    /// File name for a period's state file
    pub fn file_name(period: &str) -> String {
        format!("{}.json", period_file_stem(period))
    }

    /// Local path of a period's state file
    pub fn path_for(&self, period: &str) -> PathBuf {
        self.state_dir.join(Self::file_name(period))
    }

    /// Object key of a period's state file
    pub fn key_for(&self, period: &str) -> String {
        object_key(&self.prefix, &Self::file_name(period))
    }

    /// Loads the saved targets for a period
    ///
    /// Pulls the remote copy first when one exists. A period that was never
    /// saved yields an empty list.
    pub async fn load(&self, period: &str) -> Result<Vec<Target>, StateError> {
        let path = self.path_for(period);

        if let Some(remote) = &self.remote {
            let key = self.key_for(period);
            if remote.exists(&key).await? {
                tracing::debug!(
                    "Downloading previous state {} from {}",
                    key,
                    remote.location()
                );
                remote.download(&key, &path).await?;
            }
        }

        read_targets(&path).await
    }

    /// Writes the targets for a period and pushes them to the remote store
    ///
    /// The local file is replaced atomically so an interrupted write never
    /// leaves a truncated state file behind.
    pub async fn save(&self, period: &str, targets: &[Target]) -> Result<PathBuf, StateError> {
        let path = self.path_for(period);
        write_targets(&path, targets).await?;
        tracing::debug!("Saved {} targets to {}", targets.len(), path.display());

        if let Some(remote) = &self.remote {
            let key = self.key_for(period);
            remote.upload(&path, &key).await?;
            tracing::info!("Uploaded {} to {}", key, remote.location());
        }

        Ok(path)
    }
}

/// A period name usable as a file name: trimmed, with path separators
/// replaced by `-`
pub fn period_file_stem(period: &str) -> String {
    period
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect()
}

async fn read_targets(path: &Path) -> Result<Vec<Target>, StateError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StateError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content).map_err(|source| StateError::Json {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_targets(path: &Path, targets: &[Target]) -> Result<(), StateError> {
    let io_err = |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let json = serde_json::to_vec_pretty(targets).map_err(|source| StateError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).await.map_err(io_err)?;
    fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
