//! In-process fake ComfyUI server for the worker's integration tests.
//!
//! Serves `GET /`, `POST /prompt`, and `GET /history/{id}` on an
//! ephemeral port and counts every hit so tests can assert exact
//! attempt numbers.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use genbridge_cloud::StorageConfig;
use genbridge_comfyui::api::HttpTimeouts;
use genbridge_comfyui::retry::RetryPolicy;
use genbridge_worker::config::WorkerConfig;
use serde_json::{json, Value};

/// Retry interval used by test configurations.
pub const FAST: std::time::Duration = std::time::Duration::from_millis(2);

/// Scripted behaviour of the fake engine.
#[derive(Debug, Clone)]
pub struct Behaviour {
    /// Number of health checks answered with 503 before answering 200.
    pub unhealthy_checks: usize,
    /// Body returned by `POST /prompt`.
    pub submit_body: Value,
    /// Raw text returned by `POST /prompt` instead of `submit_body`.
    pub submit_raw: Option<&'static str>,
    /// Status returned by `POST /prompt`.
    pub submit_status: StatusCode,
    /// History attempt (1-based) on which the record appears.
    pub complete_on: usize,
    /// Status returned by `GET /history/{id}`.
    pub history_status: StatusCode,
    /// Outputs reported once the prompt is complete.
    pub outputs: Value,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            unhealthy_checks: 0,
            submit_body: json!({ "prompt_id": "abc123", "number": 0, "node_errors": {} }),
            submit_raw: None,
            submit_status: StatusCode::OK,
            complete_on: 1,
            history_status: StatusCode::OK,
            outputs: json!({ "9": { "images": [ { "filename": "cat.png", "subfolder": "", "type": "output" } ] } }),
        }
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub health: AtomicUsize,
    pub submit: AtomicUsize,
    pub history: AtomicUsize,
    pub submitted: Mutex<Vec<Value>>,
}

impl Counters {
    pub fn health(&self) -> usize {
        self.health.load(Ordering::SeqCst)
    }

    pub fn submit(&self) -> usize {
        self.submit.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> usize {
        self.history.load(Ordering::SeqCst)
    }

    /// Request bodies received by `POST /prompt`, in arrival order.
    pub fn submitted(&self) -> Vec<Value> {
        self.submitted.lock().unwrap().clone()
    }
}

struct EngineState {
    behaviour: Behaviour,
    counters: Arc<Counters>,
}

pub struct FakeEngine {
    pub addr: SocketAddr,
    pub counters: Arc<Counters>,
}

impl FakeEngine {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Worker configuration pointing at this engine with fast budgets.
    pub fn config(&self, output_path: &std::path::Path) -> WorkerConfig {
        WorkerConfig {
            comfy_host: self.addr.to_string(),
            output_path: output_path.to_path_buf(),
            readiness: RetryPolicy::new(3, FAST),
            polling: RetryPolicy::new(5, FAST),
            timeouts: HttpTimeouts::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Start a fake engine on `127.0.0.1:0`.
pub async fn spawn_engine(behaviour: Behaviour) -> FakeEngine {
    let counters = Arc::new(Counters::default());
    let state = Arc::new(EngineState {
        behaviour,
        counters: Arc::clone(&counters),
    });

    let app = Router::new()
        .route("/", get(health))
        .route("/prompt", post(submit))
        .route("/history/{prompt_id}", get(history))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeEngine { addr, counters }
}

/// An address nothing listens on.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// An address that accepts connections and never answers.
///
/// Accepted sockets are held open for the lifetime of the runtime.
pub async fn silent_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

async fn health(State(state): State<Arc<EngineState>>) -> StatusCode {
    let hit = state.counters.health.fetch_add(1, Ordering::SeqCst) + 1;
    if hit > state.behaviour.unhealthy_checks {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn submit(
    State(state): State<Arc<EngineState>>,
    Json(request): Json<Value>,
) -> Response {
    state.counters.submit.fetch_add(1, Ordering::SeqCst);
    state.counters.submitted.lock().unwrap().push(request);
    let behaviour = &state.behaviour;
    match behaviour.submit_raw {
        Some(raw) => (behaviour.submit_status, raw).into_response(),
        None => (behaviour.submit_status, Json(behaviour.submit_body.clone())).into_response(),
    }
}

async fn history(
    State(state): State<Arc<EngineState>>,
    Path(prompt_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let hit = state.counters.history.fetch_add(1, Ordering::SeqCst) + 1;
    let behaviour = &state.behaviour;
    if !behaviour.history_status.is_success() {
        return (behaviour.history_status, Json(json!({ "error": "boom" })));
    }
    if hit >= behaviour.complete_on {
        let mut record = serde_json::Map::new();
        record.insert(prompt_id, json!({ "outputs": behaviour.outputs }));
        (StatusCode::OK, Json(Value::Object(record)))
    } else {
        (StatusCode::OK, Json(json!({})))
    }
}
