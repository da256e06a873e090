//! Storage configuration.
//!
//! A [`StorageConfig`] is a plain value. The process loads defaults once
//! from the environment; each job derives its own copy by overlaying the
//! credentials it carries. Nothing here is shared or mutated across jobs.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use genbridge_core::job_input::BucketCredentials;

/// Signing region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Directory used for simulated uploads.
pub const DEFAULT_SIMULATED_DIR: &str = "simulated_uploaded";

/// Format of the fallback bucket name (`MM-YY`).
const BUCKET_DATE_FORMAT: &str = "%m-%y";

#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Remote endpoint. Its presence switches artifacts to remote storage.
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Default bucket name.
    pub bucket_name: Option<String>,
    pub region: String,
    /// Where simulated uploads are written.
    pub simulated_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            bucket_name: None,
            region: DEFAULT_REGION.to_string(),
            simulated_dir: PathBuf::from(DEFAULT_SIMULATED_DIR),
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("simulated_dir", &self.simulated_dir)
            .finish()
    }
}

impl StorageConfig {
    /// Overlay job-supplied credentials on top of these defaults.
    ///
    /// Present fields replace the defaults; absent fields keep them.
    /// Empty strings count as absent.
    pub fn with_job_credentials(&self, creds: &BucketCredentials) -> Self {
        fn pick(job: &Option<String>, default: &Option<String>) -> Option<String> {
            non_empty(job.as_deref())
                .map(str::to_string)
                .or_else(|| default.clone())
        }

        Self {
            endpoint_url: pick(&creds.endpoint_url, &self.endpoint_url),
            access_key_id: pick(&creds.access_id, &self.access_key_id),
            secret_access_key: pick(&creds.access_secret, &self.secret_access_key),
            bucket_name: pick(&creds.bucket_name, &self.bucket_name),
            region: self.region.clone(),
            simulated_dir: self.simulated_dir.clone(),
        }
    }

    /// Whether artifacts go to object storage instead of inline encoding.
    pub fn is_remote(&self) -> bool {
        non_empty(self.endpoint_url.as_deref()).is_some()
    }

    /// Whether both halves of the credential pair are present.
    pub fn has_credentials(&self) -> bool {
        non_empty(self.access_key_id.as_deref()).is_some()
            && non_empty(self.secret_access_key.as_deref()).is_some()
    }

    /// Resolve the target bucket.
    ///
    /// Order: `explicit`, then the configured bucket name, then the
    /// month and year of `now` (e.g. `10-26`).
    pub fn resolve_bucket(&self, explicit: Option<&str>, now: DateTime<Utc>) -> String {
        non_empty(explicit)
            .or_else(|| non_empty(self.bucket_name.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| now.format(BUCKET_DATE_FORMAT).to_string())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
