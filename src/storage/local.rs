use crate::storage::traits::{ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A directory used as a bucket
///
/// Useful for mounted network shares and for exercising the sync logic
/// without cloud credentials.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, key: &str) -> StorageResult<PathBuf> {
        let mut path = self.root.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            if segment == ".." || segment == "." {
                return Err(StorageError::Backend(format!("invalid key: {}", key)));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.full_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()> {
        let source = self.full_path(key)?;
        if !fs::try_exists(&source).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&source, local_path).await?;
        Ok(())
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        let destination = self.full_path(key)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(local_path, &destination).await?;
        Ok(())
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}
