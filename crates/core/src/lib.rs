//! Shared types for the generation job bridge.
//!
//! Holds the error type, the validated job input model, the outbound
//! job result shape, and media-type helpers used by both the storage
//! and output-resolution layers. No I/O lives here.

pub mod error;
pub mod job_input;
pub mod media;
pub mod output;
