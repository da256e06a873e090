//! End-to-end tests for the job orchestrator against a fake engine.

mod common;

use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use common::{spawn_engine, Behaviour};
use genbridge_core::job_input::{MSG_INVALID_JSON, MSG_MISSING_INPUT};
use genbridge_core::output::JobOutput;
use genbridge_worker::handler::JobHandler;
use serde_json::json;

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cat_job_succeeds_with_inline_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = b"\x89PNG\r\n\x1a\ncat pixels".to_vec();
    std::fs::write(dir.path().join("cat.png"), &bytes).unwrap();

    let engine = spawn_engine(Behaviour {
        complete_on: 3,
        outputs: json!({ "9": { "images": [ { "filename": "cat.png" } ] } }),
        ..Default::default()
    })
    .await;
    let handler = JobHandler::new(engine.config(dir.path())).unwrap();

    let output = handler
        .handle_value(json!({
            "id": "job-1",
            "input": { "comfy_input": { "prompt": "a cat" } }
        }))
        .await;

    let artifacts = output.artifacts().expect("job should succeed");
    assert_eq!(artifacts.len(), 1);
    let payload = artifacts[0]
        .strip_prefix("data:image/png;base64,")
        .expect("inline PNG reference");
    assert_eq!(STANDARD.decode(payload).unwrap(), bytes);

    assert_eq!(engine.counters.history(), 3);
    assert_eq!(engine.counters.submitted(), vec![json!({ "prompt": "a cat" })]);
}

#[tokio::test]
async fn string_input_is_submitted_like_an_object() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cat.png"), b"x").unwrap();
    let engine = spawn_engine(Behaviour::default()).await;
    let handler = JobHandler::new(engine.config(dir.path())).unwrap();

    let output = handler
        .handle_value(json!({
            "id": "job-2",
            "input": r#"{"comfy_input": {"prompt": "a cat"}}"#
        }))
        .await;

    assert!(output.is_success());
    assert_eq!(engine.counters.submitted(), vec![json!({ "prompt": "a cat" })]);
}

#[tokio::test]
async fn output_path_override_is_used() {
    let default_dir = tempfile::tempdir().unwrap();
    let override_dir = tempfile::tempdir().unwrap();
    std::fs::write(override_dir.path().join("cat.png"), b"x").unwrap();
    let engine = spawn_engine(Behaviour::default()).await;
    let handler = JobHandler::new(engine.config(default_dir.path())).unwrap();

    let output = handler
        .handle_value(json!({
            "id": "job-3",
            "input": {
                "comfy_input": {},
                "output_path": override_dir.path().to_str().unwrap()
            }
        }))
        .await;

    assert!(output.is_success());
}

#[tokio::test]
async fn bucket_creds_are_not_forwarded_or_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let simulated = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cat.png"), b"x").unwrap();
    let engine = spawn_engine(Behaviour::default()).await;
    let mut config = engine.config(dir.path());
    config.storage.simulated_dir = simulated.path().to_path_buf();
    let handler = JobHandler::new(config).unwrap();

    // Endpoint without credentials: uploads land in the simulated dir.
    let output = handler
        .handle_value(json!({
            "id": "job-4",
            "input": {
                "bucket_creds": { "endpointUrl": "https://s3.example.com" },
                "prompt": { "1": {} }
            }
        }))
        .await;

    let artifacts = output.artifacts().expect("job should succeed").to_vec();
    assert!(std::path::Path::new(&artifacts[0]).starts_with(simulated.path()));
    assert_eq!(engine.counters.submitted(), vec![json!({ "prompt": { "1": {} } })]);

    // The next job without credentials goes back to inline encoding.
    assert!(!handler.config().storage.is_remote());
    let output = handler
        .handle_value(json!({ "id": "job-5", "input": { "comfy_input": {} } }))
        .await;
    assert!(output.artifacts().unwrap()[0].starts_with("data:image/png;base64,"));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_inputs_fail_without_submission() {
    let dir = tempfile::tempdir().unwrap();
    let engine = spawn_engine(Behaviour::default()).await;
    let handler = JobHandler::new(engine.config(dir.path())).unwrap();

    let missing = handler.handle_value(json!({ "id": "j" })).await;
    assert_eq!(missing, JobOutput::error(MSG_MISSING_INPUT));

    let not_json = handler
        .handle_value(json!({ "id": "j", "input": "not json" }))
        .await;
    assert_eq!(not_json, JobOutput::error(MSG_INVALID_JSON));

    let number = handler.handle_value(json!({ "id": "j", "input": 42 })).await;
    assert!(number
        .error_message()
        .unwrap()
        .starts_with("'prompt' must be a JSON object or a JSON-encoded string"));

    assert_eq!(engine.counters.submit(), 0);
}

#[tokio::test]
async fn submission_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let engine = spawn_engine(Behaviour {
        submit_body: json!({ "error": "invalid prompt" }),
        ..Default::default()
    })
    .await;
    let handler = JobHandler::new(engine.config(dir.path())).unwrap();

    let output = handler
        .handle_value(json!({ "id": "j", "input": { "comfy_input": {} } }))
        .await;

    assert!(output
        .error_message()
        .unwrap()
        .starts_with("Error queuing prompt:"));
    assert_eq!(engine.counters.history(), 0);
}

#[tokio::test]
async fn poll_budget_override_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let engine = spawn_engine(Behaviour {
        complete_on: usize::MAX,
        ..Default::default()
    })
    .await;
    let handler = JobHandler::new(engine.config(dir.path())).unwrap();

    let output = handler
        .handle_value(json!({
            "id": "j",
            "input": { "comfy_input": {}, "polling_max_retries": 2 }
        }))
        .await;

    assert_eq!(
        output,
        JobOutput::error("Max retries reached while waiting for image generation")
    );
    assert_eq!(engine.counters.history(), 2);
}

#[tokio::test]
async fn history_failure_is_reported_as_polling_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = spawn_engine(Behaviour {
        history_status: StatusCode::INTERNAL_SERVER_ERROR,
        ..Default::default()
    })
    .await;
    let handler = JobHandler::new(engine.config(dir.path())).unwrap();

    let output = handler
        .handle_value(json!({ "id": "j", "input": { "comfy_input": {} } }))
        .await;

    assert!(output
        .error_message()
        .unwrap()
        .starts_with("Error waiting for image generation:"));
    assert_eq!(engine.counters.history(), 1);
}

#[tokio::test]
async fn missing_artifact_is_a_status_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = spawn_engine(Behaviour::default()).await;
    let handler = JobHandler::new(engine.config(dir.path())).unwrap();

    let output = handler
        .handle_value(json!({ "id": "j", "input": { "comfy_input": {} } }))
        .await;

    assert_eq!(
        output,
        JobOutput::resolution_failed(format!(
            "the image does not exist in the specified output folder: {}",
            dir.path().join("cat.png").display()
        ))
    );
}

#[tokio::test]
async fn unhealthy_engine_does_not_block_submission() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cat.png"), b"x").unwrap();
    let engine = spawn_engine(Behaviour {
        unhealthy_checks: 100,
        ..Default::default()
    })
    .await;
    let handler = JobHandler::new(engine.config(dir.path())).unwrap();

    let output = handler
        .handle_value(json!({ "id": "j", "input": { "comfy_input": {} } }))
        .await;

    assert!(output.is_success());
    assert_eq!(engine.counters.health(), 3);
    assert_eq!(engine.counters.submit(), 1);
}
