//! Remote object storage for state files and output
//!
//! This module handles syncing files with a bucket-like store so that
//! consecutive runs on different machines share the same period state:
//! - The `ObjectStore` trait (exists / download / upload)
//! - A directory-backed store
//! - An S3 store (with the `s3` feature)

mod local;
#[cfg(feature = "s3")]
mod s3;
mod traits;

pub use local::LocalObjectStore;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;
pub use traits::{ObjectStore, StorageError, StorageResult};

use crate::config::{RemoteConfig, RemoteKind};
use std::sync::Arc;

/// Opens the object store described by the remote configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn ObjectStore>)` - Store ready for use
/// * `Err(StorageError)` - The store could not be set up, or the `s3` kind was
///   requested without the `s3` feature compiled in
pub async fn open_object_store(config: &RemoteConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config.kind {
        RemoteKind::Local => {
            let root = config
                .root
                .clone()
                .ok_or_else(|| StorageError::Config("missing root".to_string()))?;
            tracing::debug!("Using local object store at {}", root.display());
            Ok(Arc::new(LocalObjectStore::new(root)))
        }
        #[cfg(feature = "s3")]
        RemoteKind::S3 => {
            let store = S3ObjectStore::connect(config).await?;
            tracing::debug!("Using S3 object store {}", store.location());
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "s3"))]
        RemoteKind::S3 => Err(StorageError::Config(
            "this build does not include S3 support (enable the `s3` feature)".to_string(),
        )),
    }
}
