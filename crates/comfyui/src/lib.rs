//! ComfyUI REST client library.
//!
//! Provides the HTTP API wrapper, the bounded readiness probe, the
//! completion poller, and typed parsing of the engine's history record
//! for driving a locally running ComfyUI server one job at a time.

pub mod api;
pub mod history;
pub mod poller;
pub mod readiness;
pub mod retry;
