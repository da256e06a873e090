//! Local stand-in for object storage.
//!
//! Writes each object to `{dir}/{last key segment}` and returns that
//! local path as the reference. Used when a storage endpoint is set but
//! no credentials are available, which is typical for local runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::store::{ObjectStore, StorageError};

pub struct SimulatedStore {
    dir: PathBuf,
}

impl SimulatedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Local path an object key is written to. Bucket and key prefixes
    /// are dropped.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name = Path::new(key)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(key));
        self.dir.join(name)
    }
}

#[async_trait]
impl ObjectStore for SimulatedStore {
    async fn put_object(
        &self,
        _bucket: &str,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        tokio::fs::write(&path, body).await?;
        tracing::info!(path = %path.display(), "Saved simulated upload");
        Ok(())
    }

    async fn retrieval_url(
        &self,
        _bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> Result<String, StorageError> {
        Ok(self.path_for(key).display().to_string())
    }
}
