//! Outbound job result shape.
//!
//! The job-queue runtime receives exactly one of:
//!
//! - `{"status": "success", "message": ["<artifact reference>", ...]}`
//! - `{"status": "error", "message": "<reason>"}` (output resolution failed)
//! - `{"error": "<reason>"}` (validation, submission, or polling failed)

use serde::{Deserialize, Serialize};

/// Status tag of a resolved job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Error,
}

/// Payload of the `message` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobMessage {
    /// Ordered artifact references, one per produced image.
    Artifacts(Vec<String>),
    /// Human-readable failure reason.
    Text(String),
}

/// The single terminal result of one job invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    /// The job reached output resolution.
    Resolved {
        status: JobStatus,
        message: JobMessage,
    },
    /// The job failed before any output was produced.
    Error { error: String },
}

impl JobOutput {
    /// Every artifact resolved; references are in engine output order.
    pub fn success(artifacts: Vec<String>) -> Self {
        Self::Resolved {
            status: JobStatus::Success,
            message: JobMessage::Artifacts(artifacts),
        }
    }

    /// Output resolution failed. No partial artifact list is returned.
    pub fn resolution_failed(message: impl Into<String>) -> Self {
        Self::Resolved {
            status: JobStatus::Error,
            message: JobMessage::Text(message.into()),
        }
    }

    /// The job failed before output resolution.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Resolved {
                status: JobStatus::Success,
                ..
            }
        )
    }

    /// Artifact references of a successful job.
    pub fn artifacts(&self) -> Option<&[String]> {
        match self {
            Self::Resolved {
                status: JobStatus::Success,
                message: JobMessage::Artifacts(refs),
            } => Some(refs),
            _ => None,
        }
    }

    /// Failure reason, regardless of which failure shape carries it.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Resolved {
                status: JobStatus::Error,
                message: JobMessage::Text(msg),
            } => Some(msg),
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}
