//! Job input model and shape validation.
//!
//! The job-queue runtime hands the worker an untyped `input` value. It
//! may be a JSON object or a JSON-encoded string. Either way it is
//! normalised to an object, storage credentials are split off, the
//! operational overrides are read, and the generation request is taken
//! from the nested `comfy_input` field (or the whole object when that
//! field is absent).

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Key holding the nested generation request.
pub const COMFY_INPUT_KEY: &str = "comfy_input";
/// Key holding per-job storage credentials.
pub const BUCKET_CREDS_KEY: &str = "bucket_creds";
/// Key overriding the completion poll attempt budget.
pub const POLLING_MAX_RETRIES_KEY: &str = "polling_max_retries";
/// Key overriding the output directory.
pub const OUTPUT_PATH_KEY: &str = "output_path";

/// Returned when the job carries no input at all.
pub const MSG_MISSING_INPUT: &str = "Please provide the 'prompt'";
/// Returned when a string input is not valid JSON.
pub const MSG_INVALID_JSON: &str = "Invalid JSON format in 'prompt'";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Storage credentials a job may carry under `bucket_creds`.
///
/// Every field is optional; present fields override the process
/// defaults for this invocation only.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BucketCredentials {
    #[serde(rename = "endpointUrl", default)]
    pub endpoint_url: Option<String>,
    #[serde(rename = "accessId", default)]
    pub access_id: Option<String>,
    #[serde(rename = "accessSecret", default)]
    pub access_secret: Option<String>,
    #[serde(rename = "bucketName", default)]
    pub bucket_name: Option<String>,
}

impl fmt::Debug for BucketCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketCredentials")
            .field("endpoint_url", &self.endpoint_url)
            .field("access_id", &self.access_id)
            .field(
                "access_secret",
                &self.access_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

/// A validated job input.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInput {
    /// The generation request, forwarded verbatim to the engine.
    pub request: Map<String, Value>,
    /// Credentials hoisted out of the input, if any were supplied.
    pub bucket_creds: Option<BucketCredentials>,
    /// Override for the completion poll attempt budget.
    pub polling_max_retries: Option<u32>,
    /// Override for the output directory.
    pub output_path: Option<String>,
}

impl JobInput {
    /// Validate the raw `input` value of a job.
    ///
    /// `None` and `null` are rejected as missing. Strings are parsed as
    /// JSON and must decode to an object. Any other shape is rejected.
    pub fn parse(input: Option<Value>) -> Result<Self, CoreError> {
        let mut fields = match input {
            None | Some(Value::Null) => {
                return Err(CoreError::Validation(MSG_MISSING_INPUT.into()));
            }
            Some(Value::Object(map)) => map,
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => return Err(shape_error(&Value::String(raw))),
                Err(_) => return Err(CoreError::Validation(MSG_INVALID_JSON.into())),
            },
            Some(other) => return Err(shape_error(&other)),
        };

        // Credentials never reach the engine, even when the whole input
        // object doubles as the generation request.
        let bucket_creds = match fields.remove(BUCKET_CREDS_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value).map_err(|e| {
                CoreError::Validation(format!("'{BUCKET_CREDS_KEY}' is malformed: {e}"))
            })?),
        };

        let polling_max_retries = match fields.get(POLLING_MAX_RETRIES_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| {
                        CoreError::Validation(format!(
                            "'{POLLING_MAX_RETRIES_KEY}' must be a non-negative integer, got {value}"
                        ))
                    })?,
            ),
        };

        let output_path = match fields.get(OUTPUT_PATH_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(path)) => Some(path.clone()),
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "'{OUTPUT_PATH_KEY}' must be a string, got {other}"
                )));
            }
        };

        let request = match fields.remove(COMFY_INPUT_KEY) {
            Some(Value::Object(inner)) => inner,
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "'{COMFY_INPUT_KEY}' must be a JSON object, got {other}"
                )));
            }
            None => fields,
        };

        Ok(Self {
            request,
            bucket_creds,
            polling_max_retries,
            output_path,
        })
    }

    /// The generation request as a JSON value, ready for submission.
    pub fn request_value(&self) -> Value {
        Value::Object(self.request.clone())
    }
}

fn shape_error(input: &Value) -> CoreError {
    CoreError::Validation(format!(
        "'prompt' must be a JSON object or a JSON-encoded string, job_input: {input}"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
