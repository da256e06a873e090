//! Completion poller.
//!
//! After submission the worker repeatedly fetches the prompt's history
//! until the engine records outputs for it. Unlike the readiness probe,
//! running out of attempts is an error the caller must report.

use crate::api::{ComfyUIApi, ComfyUIApiError};
use crate::history::CompletionRecord;
use crate::retry::RetryPolicy;

/// Errors from [`poll_completion`].
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The attempt budget ran out before outputs appeared.
    #[error("Max retries reached while waiting for image generation ({attempts} attempts)")]
    TimedOut { attempts: u32 },

    /// Polling cannot start without a correlation identifier.
    #[error("Cannot poll without a prompt id")]
    EmptyPromptId,

    /// A history fetch failed. Polling stops at the first failure.
    #[error(transparent)]
    Api(#[from] ComfyUIApiError),
}

/// Poll `GET /history/{prompt_id}` until the prompt has outputs.
///
/// Fetches at most `policy.max_attempts` times, returning the record as
/// soon as it is complete. Sleeps `policy.interval` between attempts.
/// A fetch error aborts immediately without further attempts.
pub async fn poll_completion(
    api: &ComfyUIApi,
    prompt_id: &str,
    policy: &RetryPolicy,
) -> Result<CompletionRecord, PollError> {
    if prompt_id.is_empty() {
        return Err(PollError::EmptyPromptId);
    }

    let mut attempt = 0u32;
    while attempt < policy.max_attempts {
        attempt += 1;

        let history = api.get_history(prompt_id).await?;
        if let Some(record) = CompletionRecord::from_history(&history, prompt_id) {
            tracing::info!(prompt_id, attempt, "Image generation complete");
            return Ok(record);
        }

        tracing::debug!(prompt_id, attempt, "Prompt not complete yet");
        if policy.has_next(attempt) {
            tokio::time::sleep(policy.interval).await;
        }
    }

    tracing::warn!(prompt_id, attempts = attempt, "Completion poll budget exhausted");
    Err(PollError::TimedOut { attempts: attempt })
}
