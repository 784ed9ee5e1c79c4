//! Upload flow for a single local file.
//!
//! This crate holds the **business logic** only. The drive and the object
//! store are reached through the [`DriveApi`] and [`ObjectStore`] traits,
//! implemented here for the real HTTP clients and by mocks in tests.
//!
//! # Pipeline
//!
//! 1. **Check**: fingerprint the file and create the drive entry; an
//!    entry already in phase `COMPLETE` ends the upload
//! 2. **Initiate**: open a multipart upload on the returned target
//! 3. **Transfer**: upload every part with the worker pool
//! 4. **Finalize**: complete the upload with the ordered part list

pub mod backend;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod types;

// Re-export primary types for convenience.
pub use backend::{DriveApi, ObjectStore};
pub use config::UploadConfig;
pub use error::UploadError;
pub use orchestrator::UploadOrchestrator;
pub use types::UploadEvent;
