use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use genbridge_cloud::config::{DEFAULT_REGION, DEFAULT_SIMULATED_DIR};
use genbridge_cloud::StorageConfig;
use genbridge_comfyui::api::{HttpTimeouts, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use genbridge_comfyui::retry::{
    RetryPolicy, API_AVAILABLE_INTERVAL, API_AVAILABLE_MAX_RETRIES, POLLING_INTERVAL,
    POLLING_MAX_RETRIES,
};
use genbridge_core::error::CoreError;

/// Host and port of the local ComfyUI server.
pub const DEFAULT_COMFY_HOST: &str = "127.0.0.1:8188";

/// Directory ComfyUI writes generated images to.
pub const DEFAULT_OUTPUT_PATH: &str = "/comfyui/output";

/// Worker configuration loaded from environment variables.
///
/// Loaded once at process start. Jobs never modify it; per-job storage
/// credentials are overlaid on a copy of [`storage`](Self::storage).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Engine `host:port` (default: `127.0.0.1:8188`).
    pub comfy_host: String,
    /// Default output directory (default: `/comfyui/output`).
    pub output_path: PathBuf,
    /// Readiness check budget.
    pub readiness: RetryPolicy,
    /// Default completion poll budget. Jobs may override the attempt count.
    pub polling: RetryPolicy,
    /// Time limits for each engine request.
    pub timeouts: HttpTimeouts,
    /// Process-wide storage defaults.
    pub storage: StorageConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            comfy_host: DEFAULT_COMFY_HOST.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            readiness: RetryPolicy::readiness(),
            polling: RetryPolicy::polling(),
            timeouts: HttpTimeouts::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default              |
    /// |-----------------------------------|----------------------|
    /// | `COMFY_HOST`                      | `127.0.0.1:8188`     |
    /// | `COMFY_OUTPUT_PATH`               | `/comfyui/output`    |
    /// | `COMFY_API_AVAILABLE_INTERVAL_MS` | `50`                 |
    /// | `COMFY_API_AVAILABLE_MAX_RETRIES` | `500`                |
    /// | `COMFY_POLLING_INTERVAL_MS`       | `250`                |
    /// | `COMFY_POLLING_MAX_RETRIES`       | `500`                |
    /// | `COMFY_CONNECT_TIMEOUT_MS`        | `5000`               |
    /// | `COMFY_REQUEST_TIMEOUT_MS`        | `30000`              |
    /// | `BUCKET_ENDPOINT_URL`             | unset                |
    /// | `BUCKET_ACCESS_KEY_ID`            | unset                |
    /// | `BUCKET_SECRET_ACCESS_KEY`        | unset                |
    /// | `BUCKET_NAME`                     | unset                |
    /// | `BUCKET_REGION`                   | `us-east-1`          |
    /// | `SIMULATED_UPLOAD_DIR`            | `simulated_uploaded` |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let comfy_host = var("COMFY_HOST").unwrap_or_else(|| DEFAULT_COMFY_HOST.into());
        let output_path =
            PathBuf::from(var("COMFY_OUTPUT_PATH").unwrap_or_else(|| DEFAULT_OUTPUT_PATH.into()));

        let count = |key: &str, default: u32| parse_or(key, var(key), default);
        let millis = |key: &str, default: Duration| parse_millis_or(key, var(key), default);

        let readiness = RetryPolicy::new(
            count("COMFY_API_AVAILABLE_MAX_RETRIES", API_AVAILABLE_MAX_RETRIES)?,
            millis("COMFY_API_AVAILABLE_INTERVAL_MS", API_AVAILABLE_INTERVAL)?,
        );
        let polling = RetryPolicy::new(
            count("COMFY_POLLING_MAX_RETRIES", POLLING_MAX_RETRIES)?,
            millis("COMFY_POLLING_INTERVAL_MS", POLLING_INTERVAL)?,
        );
        let timeouts = HttpTimeouts {
            connect: millis("COMFY_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT)?,
            request: millis("COMFY_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT)?,
        };

        let storage = StorageConfig {
            endpoint_url: var("BUCKET_ENDPOINT_URL"),
            access_key_id: var("BUCKET_ACCESS_KEY_ID"),
            secret_access_key: var("BUCKET_SECRET_ACCESS_KEY"),
            bucket_name: var("BUCKET_NAME"),
            region: var("BUCKET_REGION").unwrap_or_else(|| DEFAULT_REGION.into()),
            simulated_dir: PathBuf::from(
                var("SIMULATED_UPLOAD_DIR").unwrap_or_else(|| DEFAULT_SIMULATED_DIR.into()),
            ),
        };

        Ok(Self {
            comfy_host,
            output_path,
            readiness,
            polling,
            timeouts,
            storage,
        })
    }

    /// Base HTTP URL of the engine, e.g. `http://127.0.0.1:8188`.
    pub fn api_url(&self) -> String {
        if self.comfy_host.starts_with("http://") || self.comfy_host.starts_with("https://") {
            self.comfy_host.clone()
        } else {
            format!("http://{}", self.comfy_host)
        }
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, CoreError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            CoreError::Validation(format!(
                "{key} must be a non-negative integer, got '{raw}'"
            ))
        }),
    }
}

fn parse_millis_or(key: &str, raw: Option<String>, default: Duration) -> Result<Duration, CoreError> {
    let millis = parse_or(key, raw, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}
