use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Outcome of a bucket-ensure call, recorded on the collection row as a
/// best-effort side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    Created,
    Existing,
}

impl BucketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketState::Created => "created",
            BucketState::Existing => "existing",
        }
    }
}

/// Durable byte storage for raw uploaded files, keyed by bucket + object
/// name. One bucket per collection.
#[async_trait]
pub trait BucketStorage: Send + Sync {
    async fn ensure_bucket(&self, bucket: &str) -> AppResult<BucketState>;

    async fn put_object(&self, bucket: &str, object: &str, bytes: &[u8]) -> AppResult<()>;

    async fn remove_object(&self, bucket: &str, object: &str) -> AppResult<()>;

    /// Moves every object of `old` into `new` and removes `old`.
    async fn rename_bucket(&self, old: &str, new: &str) -> AppResult<()>;

    /// Removes the bucket and everything in it.
    async fn remove_bucket(&self, bucket: &str) -> AppResult<()>;
}

/// Filesystem-backed storage: a bucket is a directory under the configured
/// root, an object is a file inside it.
pub struct FsBucketStorage {
    root: PathBuf,
}

impl FsBucketStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FsBucketStorage {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }
}

fn storage_err(context: &str, e: std::io::Error) -> AppError {
    AppError::Storage(format!("{}: {}", context, e))
}

#[async_trait]
impl BucketStorage for FsBucketStorage {
    async fn ensure_bucket(&self, bucket: &str) -> AppResult<BucketState> {
        let path = self.bucket_path(bucket);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| storage_err("Failed to check bucket", e))?
        {
            return Ok(BucketState::Existing);
        }
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| storage_err("Failed to create bucket", e))?;
        Ok(BucketState::Created)
    }

    async fn put_object(&self, bucket: &str, object: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.bucket_path(bucket).join(object);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| storage_err("Failed to store object", e))
    }

    async fn remove_object(&self, bucket: &str, object: &str) -> AppResult<()> {
        let path = self.bucket_path(bucket).join(object);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| storage_err("Failed to delete object", e))
    }

    async fn rename_bucket(&self, old: &str, new: &str) -> AppResult<()> {
        let old_path = self.bucket_path(old);
        let new_path = self.bucket_path(new);
        tokio::fs::rename(&old_path, &new_path)
            .await
            .map_err(|e| storage_err("Failed to rename bucket", e))
    }

    async fn remove_bucket(&self, bucket: &str) -> AppResult<()> {
        let path = self.bucket_path(bucket);
        tokio::fs::remove_dir_all(&path)
            .await
            .map_err(|e| storage_err("Failed to delete bucket", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bucket_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsBucketStorage::new(dir.path());

        assert_eq!(
            storage.ensure_bucket("collection-1-demo").await.unwrap(),
            BucketState::Created
        );
        assert_eq!(
            storage.ensure_bucket("collection-1-demo").await.unwrap(),
            BucketState::Existing
        );

        storage
            .put_object("collection-1-demo", "a.txt", b"hello")
            .await
            .unwrap();
        let on_disk = dir.path().join("collection-1-demo").join("a.txt");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"hello");

        storage
            .rename_bucket("collection-1-demo", "collection-1-renamed")
            .await
            .unwrap();
        assert!(!on_disk.exists());
        assert!(dir.path().join("collection-1-renamed").join("a.txt").exists());

        storage
            .remove_object("collection-1-renamed", "a.txt")
            .await
            .unwrap();
        storage.remove_bucket("collection-1-renamed").await.unwrap();
        assert!(!dir.path().join("collection-1-renamed").exists());
    }

    #[tokio::test]
    async fn removing_missing_object_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsBucketStorage::new(dir.path());
        storage.ensure_bucket("b").await.unwrap();
        assert!(storage.remove_object("b", "missing.txt").await.is_err());
    }
}
