//! Output resolution.
//!
//! Turns the filenames in a completion record into artifact references.
//! Each file is looked up under the output directory and then either
//! uploaded to object storage (yielding a time-limited URL) or encoded
//! inline as a `data:` URL, depending on whether a storage endpoint is
//! configured. A missing file fails the whole job; references resolved
//! before it are discarded.
//!
//! Artifacts are resolved independently by [`resolve_artifact`] and
//! aggregated in order by [`resolve_outputs`].

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use genbridge_cloud::{ObjectStore, StorageConfig, StorageError, PRESIGNED_URL_TTL};
use genbridge_comfyui::history::{CompletionRecord, MalformedOutput};
use genbridge_core::media;

/// Length of the random object name prefix.
const SHORT_ID_LEN: usize = 8;

/// Where resolved artifacts go.
#[derive(Clone)]
pub enum OutputSink {
    /// Encode each artifact as a `data:` URL.
    Inline,
    /// Upload each artifact and return a retrieval URL.
    Remote {
        store: Arc<dyn ObjectStore>,
        bucket: String,
    },
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline => f.write_str("Inline"),
            Self::Remote { bucket, .. } => f.debug_struct("Remote").field("bucket", bucket).finish(),
        }
    }
}

impl OutputSink {
    /// Choose the sink for a job's storage configuration.
    ///
    /// No endpoint means inline encoding. Otherwise a store is connected
    /// and the bucket resolved once for the whole job.
    pub async fn for_config(storage: &StorageConfig) -> Result<Self, StorageError> {
        if !storage.is_remote() {
            return Ok(Self::Inline);
        }
        let store = genbridge_cloud::connect(storage).await?;
        let bucket = storage.resolve_bucket(None, Utc::now());
        Ok(Self::Remote { store, bucket })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("the image does not exist in the specified output folder: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error(transparent)]
    MalformedOutput(#[from] MalformedOutput),

    /// The engine reported a filename that is not a plain relative path.
    #[error("output filename escapes the output folder: {filename}")]
    UnsafeFilename { filename: String },

    #[error("storage setup failed: {0}")]
    StorageSetup(#[source] StorageError),

    #[error("failed to resolve {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to resolve {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
}

/// Resolve every image in `record`, preserving engine output order.
///
/// Stops at the first artifact that cannot be resolved.
pub async fn resolve_outputs(
    record: &CompletionRecord,
    job_id: &str,
    output_dir: &Path,
    sink: &OutputSink,
) -> Result<Vec<String>, ResolveError> {
    let filenames = record.filenames()?;
    tracing::info!(
        prompt_id = %record.prompt_id,
        count = filenames.len(),
        "Image generation is done, resolving outputs",
    );

    let mut references = Vec::with_capacity(filenames.len());
    for filename in &filenames {
        let path = artifact_path(output_dir, filename)?;
        references.push(resolve_artifact(&path, job_id, sink).await?);
    }
    Ok(references)
}

/// Join `filename` onto `output_dir`, rejecting names that are empty,
/// absolute, or contain `.`/`..` segments.
pub fn artifact_path(output_dir: &Path, filename: &str) -> Result<PathBuf, ResolveError> {
    let relative = Path::new(filename);
    let contained = !filename.is_empty()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !contained {
        tracing::warn!(filename, "Rejecting output filename outside the output folder");
        return Err(ResolveError::UnsafeFilename {
            filename: filename.to_string(),
        });
    }
    Ok(output_dir.join(relative))
}

/// Resolve a single artifact at `path`.
pub async fn resolve_artifact(
    path: &Path,
    job_id: &str,
    sink: &OutputSink,
) -> Result<String, ResolveError> {
    if !matches!(tokio::fs::try_exists(path).await, Ok(true)) {
        tracing::warn!(path = %path.display(), "Image does not exist in the output folder");
        return Err(ResolveError::MissingArtifact {
            path: path.to_path_buf(),
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(|source| ResolveError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match sink {
        OutputSink::Inline => Ok(encode_inline(path, &bytes)),
        OutputSink::Remote { store, bucket } => {
            let key = object_key(job_id, path);
            let content_type = media::upload_content_type(path);
            let storage_err = |source| ResolveError::Storage {
                path: path.to_path_buf(),
                source,
            };

            store
                .put_object(bucket, &key, bytes, &content_type)
                .await
                .map_err(storage_err)?;
            let url = store
                .retrieval_url(bucket, &key, PRESIGNED_URL_TTL)
                .await
                .map_err(storage_err)?;

            tracing::info!(path = %path.display(), bucket = %bucket, key = %key, "Image uploaded");
            Ok(url)
        }
    }
}

/// Encode bytes as a `data:<media type>;base64,<payload>` reference.
///
/// The media type follows the file extension, falling back to PNG.
pub fn encode_inline(path: &Path, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        media::inline_media_type(path),
        STANDARD.encode(bytes)
    )
}

/// Object key for an upload: `{job_id}/{short random id}{extension}`.
pub fn object_key(job_id: &str, path: &Path) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{job_id}/{}{}",
        &id[..SHORT_ID_LEN],
        media::dotted_extension(path)
    )
}
