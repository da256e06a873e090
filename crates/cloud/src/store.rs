//! The object storage capability and store selection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::StorageConfig;
use crate::s3::S3Store;
use crate::simulated::SimulatedStore;

/// Validity of retrieval references handed back to callers (7 days).
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Presigning failed: {0}")]
    Presign(String),

    #[error("No storage endpoint configured")]
    NotConfigured,
}

/// Store bytes under a key and produce a retrievable reference.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` at `bucket`/`key` with the given content type.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// A reference to a stored object that stays valid for `expires_in`.
    async fn retrieval_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;
}

/// Pick the store for a remote-mode configuration.
///
/// An endpoint with a complete credential pair yields an [`S3Store`].
/// An endpoint without credentials falls back to a [`SimulatedStore`].
/// No endpoint at all is [`StorageError::NotConfigured`].
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, StorageError> {
    if !config.is_remote() {
        return Err(StorageError::NotConfigured);
    }

    if config.has_credentials() {
        let store = S3Store::from_config(config).await?;
        return Ok(Arc::new(store));
    }

    tracing::warn!(
        dir = %config.simulated_dir.display(),
        "Storage endpoint set without credentials, saving uploads to disk instead",
    );
    Ok(Arc::new(SimulatedStore::new(config.simulated_dir.clone())))
}
