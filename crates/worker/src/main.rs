//! `genbridge-worker` -- local job runner.
//!
//! Reads one job document (`{"id": ..., "input": {...}}`) from the path
//! given as the first argument, or `test_input.json` when none is given,
//! runs it against the configured ComfyUI server, and prints the JSON
//! result to stdout. Configuration comes from the environment; see
//! [`WorkerConfig::from_env`].

use std::path::PathBuf;

use genbridge_worker::config::WorkerConfig;
use genbridge_worker::handler::JobHandler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Job document read when no path is given.
const DEFAULT_JOB_PATH: &str = "test_input.json";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "genbridge_worker=info,genbridge_comfyui=info,genbridge_cloud=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WorkerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let job_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_JOB_PATH));

    let raw = std::fs::read_to_string(&job_path).unwrap_or_else(|e| {
        tracing::error!(path = %job_path.display(), error = %e, "Failed to read job file");
        std::process::exit(1);
    });
    let job: serde_json::Value = serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::error!(path = %job_path.display(), error = %e, "Job file is not valid JSON");
        std::process::exit(1);
    });

    tracing::info!(
        api_url = %config.api_url(),
        output_path = %config.output_path.display(),
        job_path = %job_path.display(),
        "Starting genbridge-worker",
    );

    let handler = JobHandler::new(config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build engine client");
        std::process::exit(1);
    });
    let output = handler.handle_value(job).await;

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize job output");
            std::process::exit(1);
        }
    }
}
