//! REST API client for the ComfyUI HTTP endpoints.
//!
//! Wraps the ComfyUI HTTP API (health, prompt submission, history
//! retrieval) using [`reqwest`].

use std::time::Duration;

use serde::Deserialize;

/// Default time allowed to establish a TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time allowed for a whole request, body included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call time limits applied to every engine request.
///
/// An engine that accepts a connection and never answers fails the call
/// with [`ComfyUIApiError::Request`] once `request` elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            request: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// HTTP client for a single ComfyUI instance.
#[derive(Debug, Clone)]
pub struct ComfyUIApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by the ComfyUI `/prompt` endpoint after
/// successfully queuing a workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the queued prompt.
    pub prompt_id: String,
    /// Position in the execution queue.
    #[serde(default)]
    pub number: Option<i64>,
    /// Per-node validation errors, when the engine reports any.
    #[serde(default)]
    pub node_errors: Option<serde_json::Value>,
}

/// Errors from the ComfyUI REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ComfyUIApiError {
    /// The HTTP request itself failed (network, DNS, body decoding, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// ComfyUI returned a non-2xx status code.
    #[error("ComfyUI API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The submission response had no usable `prompt_id`.
    #[error("ComfyUI response has no prompt_id: {0}")]
    MissingPromptId(serde_json::Value),
}

impl ComfyUIApi {
    /// Create a new API client for a ComfyUI instance with the default
    /// [`HttpTimeouts`].
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://127.0.0.1:8188`.
    pub fn new(api_url: impl Into<String>) -> Result<Self, ComfyUIApiError> {
        Self::with_timeouts(api_url, HttpTimeouts::default())
    }

    /// Create an API client whose requests are bounded by `timeouts`.
    pub fn with_timeouts(
        api_url: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ComfyUIApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// HTTP API base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Issue a single `GET /` against the server.
    ///
    /// Returns the response status without judging it; connection-level
    /// failures surface as [`ComfyUIApiError::Request`].
    pub async fn ping(&self) -> Result<reqwest::StatusCode, ComfyUIApiError> {
        let response = self.client.get(format!("{}/", self.api_url)).send().await?;
        Ok(response.status())
    }

    /// Queue a generation request.
    ///
    /// Sends the request body verbatim as `POST /prompt` and returns the
    /// engine's correlation identifier. An empty or absent `prompt_id`
    /// is an error.
    pub async fn queue_prompt(
        &self,
        request: &serde_json::Value,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        let response = self
            .client
            .post(format!("{}/prompt", self.api_url))
            .json(request)
            .send()
            .await?;

        let body: serde_json::Value = Self::parse_response(response).await?;
        parse_submit_response(body)
    }

    /// Retrieve execution history for a specific prompt.
    ///
    /// Sends a `GET /history/{prompt_id}` request. The returned JSON is
    /// keyed by prompt id once the engine has recorded the execution.
    pub async fn get_history(&self, prompt_id: &str) -> Result<serde_json::Value, ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.api_url, prompt_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ComfyUIApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ComfyUIApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ComfyUIApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ComfyUIApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Extract the submission response, rejecting bodies without a
/// non-empty string `prompt_id`.
fn parse_submit_response(body: serde_json::Value) -> Result<SubmitResponse, ComfyUIApiError> {
    let has_id = body
        .get("prompt_id")
        .and_then(|id| id.as_str())
        .is_some_and(|id| !id.is_empty());
    if !has_id {
        return Err(ComfyUIApiError::MissingPromptId(body));
    }
    serde_json::from_value(body.clone()).map_err(|_| ComfyUIApiError::MissingPromptId(body))
}
