//! `genbridge-worker` library crate.
//!
//! Drives one generation job end to end against a local ComfyUI server:
//! readiness check, submission, completion polling, and output
//! resolution. The binary entrypoint lives in `main.rs`.

pub mod config;
pub mod handler;
pub mod resolver;
