//! Bounded readiness probe for a ComfyUI instance.
//!
//! The engine process may still be starting when a job arrives. Before
//! submitting, the worker polls `GET /` until it answers with a 2xx
//! status or the attempt budget runs out. Exhaustion is reported, not
//! raised: the caller submits regardless.

use crate::api::ComfyUIApi;
use crate::retry::RetryPolicy;

/// Probe the engine until it responds successfully.
///
/// Makes at most `policy.max_attempts` requests and returns `true` right
/// after the first 2xx response. Non-2xx responses and connection errors
/// count as failed attempts. Never errors.
pub async fn wait_until_ready(api: &ComfyUIApi, policy: &RetryPolicy) -> bool {
    for attempt in 1..=policy.max_attempts {
        match api.ping().await {
            Ok(status) if status.is_success() => {
                tracing::info!(api_url = %api.api_url(), attempt, "ComfyUI API is reachable");
                return true;
            }
            Ok(status) => {
                tracing::trace!(attempt, status = status.as_u16(), "ComfyUI not ready");
            }
            Err(e) => {
                tracing::trace!(attempt, error = %e, "ComfyUI not reachable");
            }
        }

        if policy.has_next(attempt) {
            tokio::time::sleep(policy.interval).await;
        }
    }

    tracing::warn!(
        api_url = %api.api_url(),
        attempts = policy.max_attempts,
        "Failed to connect to ComfyUI after exhausting the readiness budget",
    );
    false
}
