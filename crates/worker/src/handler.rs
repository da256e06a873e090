//! Job orchestration.
//!
//! [`JobHandler::handle`] is the entry point the job-queue runtime calls
//! once per job. It runs validation, the readiness check, submission,
//! completion polling, and output resolution in sequence, and always
//! returns a structured [`JobOutput`], never an error.

use std::fmt;
use std::path::PathBuf;

use genbridge_comfyui::api::{ComfyUIApi, ComfyUIApiError};
use genbridge_comfyui::poller::{poll_completion, PollError};
use genbridge_comfyui::readiness::wait_until_ready;
use genbridge_core::error::CoreError;
use genbridge_core::job_input::JobInput;
use genbridge_core::output::JobOutput;
use serde::Deserialize;

use crate::config::WorkerConfig;
use crate::resolver::{resolve_outputs, OutputSink, ResolveError};

/// Job id used when the runtime does not supply one (local runs).
pub const LOCAL_JOB_ID: &str = "local_test";

/// A job as delivered by the job-queue runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default = "local_job_id")]
    pub id: String,
    #[serde(default)]
    pub input: Option<serde_json::Value>,
}

fn local_job_id() -> String {
    LOCAL_JOB_ID.to_string()
}

/// Orchestration phases, used for log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Validating,
    AwaitingReadiness,
    Submitting,
    Polling,
    Resolving,
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::AwaitingReadiness => "awaiting_readiness",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Resolving => "resolving",
        })
    }
}

/// Terminal failures of a job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("{0}")]
    Validation(#[from] CoreError),

    #[error("Error queuing prompt: {0}")]
    Submission(#[source] ComfyUIApiError),

    #[error("Max retries reached while waiting for image generation")]
    Timeout { attempts: u32 },

    #[error("Error waiting for image generation: {0}")]
    Polling(#[source] PollError),

    #[error("{0}")]
    Resolution(#[from] ResolveError),
}

impl From<PollError> for JobError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::TimedOut { attempts } => Self::Timeout { attempts },
            other => Self::Polling(other),
        }
    }
}

impl JobError {
    /// The outbound result for this failure.
    ///
    /// Resolution failures use the `{status, message}` shape; everything
    /// earlier uses the bare `{error}` shape.
    pub fn into_output(self) -> JobOutput {
        match self {
            Self::Resolution(_) => JobOutput::resolution_failed(self.to_string()),
            other => JobOutput::error(other.to_string()),
        }
    }
}

/// Runs jobs against one ComfyUI server.
///
/// Holds only immutable configuration, so a single handler may serve
/// concurrent jobs.
#[derive(Debug, Clone)]
pub struct JobHandler {
    config: WorkerConfig,
    api: ComfyUIApi,
}

impl JobHandler {
    /// Build a handler whose engine client uses the configured timeouts.
    pub fn new(config: WorkerConfig) -> Result<Self, ComfyUIApiError> {
        let api = ComfyUIApi::with_timeouts(config.api_url(), config.timeouts)?;
        Ok(Self { config, api })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run a raw job document (`{"id": ..., "input": ...}`).
    pub async fn handle_value(&self, job: serde_json::Value) -> JobOutput {
        match serde_json::from_value::<Job>(job) {
            Ok(job) => self.handle(job).await,
            Err(e) => {
                tracing::error!(error = %e, "Job document is malformed");
                JobOutput::error(format!("Malformed job: {e}"))
            }
        }
    }

    /// Run one job to completion.
    pub async fn handle(&self, job: Job) -> JobOutput {
        tracing::info!(job_id = %job.id, "Start handler");
        match self.run(&job).await {
            Ok(references) => {
                tracing::info!(job_id = %job.id, count = references.len(), "Job succeeded");
                JobOutput::success(references)
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Job failed");
                e.into_output()
            }
        }
    }

    async fn run(&self, job: &Job) -> Result<Vec<String>, JobError> {
        let job_id = job.id.as_str();

        trace_phase(job_id, JobPhase::Validating);
        let input = JobInput::parse(job.input.clone())?;

        // Per-job storage settings never leak into the process defaults.
        let storage = match &input.bucket_creds {
            Some(creds) => self.config.storage.with_job_credentials(creds),
            None => self.config.storage.clone(),
        };
        let polling = match input.polling_max_retries {
            Some(max_attempts) => self.config.polling.with_max_attempts(max_attempts),
            None => self.config.polling,
        };
        let output_dir = input
            .output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config.output_path.clone());
        tracing::debug!(
            job_id,
            polling_max_retries = polling.max_attempts,
            output_dir = %output_dir.display(),
            remote_storage = storage.is_remote(),
            "Job input validated",
        );

        trace_phase(job_id, JobPhase::AwaitingReadiness);
        // An unreachable engine is not fatal; submission reports the real failure.
        wait_until_ready(&self.api, &self.config.readiness).await;

        trace_phase(job_id, JobPhase::Submitting);
        let submitted = self
            .api
            .queue_prompt(&input.request_value())
            .await
            .map_err(JobError::Submission)?;
        let prompt_id = submitted.prompt_id;
        tracing::info!(job_id, prompt_id = %prompt_id, "Queued prompt");

        trace_phase(job_id, JobPhase::Polling);
        let record = poll_completion(&self.api, &prompt_id, &polling).await?;

        trace_phase(job_id, JobPhase::Resolving);
        let sink = OutputSink::for_config(&storage)
            .await
            .map_err(ResolveError::StorageSetup)?;
        let references = resolve_outputs(&record, job_id, &output_dir, &sink).await?;
        Ok(references)
    }
}

fn trace_phase(job_id: &str, phase: JobPhase) {
    tracing::debug!(job_id, %phase, "Job phase");
}
