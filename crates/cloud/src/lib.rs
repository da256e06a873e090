//! Object storage for generated artifacts.
//!
//! [`ObjectStore`] is the capability the output resolver needs: store
//! bytes under a bucket and key, then hand out a retrievable reference.
//! [`s3::S3Store`] talks to any S3-compatible endpoint;
//! [`simulated::SimulatedStore`] writes to a local directory when an
//! endpoint is configured without a usable credential pair.

pub mod config;
pub mod s3;
pub mod simulated;
pub mod store;

pub use config::StorageConfig;
pub use store::{connect, ObjectStore, StorageError, PRESIGNED_URL_TTL};
