//! Concurrent multipart transfer: chunk planning, positioned part reads,
//! a strided worker pool and ordered collection of part acknowledgements.

mod collector;
mod fingerprint;
mod plan;
mod pool;
mod progress;
mod reader;
mod types;

pub use collector::ResultCollector;
pub use fingerprint::{gcid_block_size, gcid_from_path, gcid_from_reader};
pub use plan::ChunkPlan;
pub use pool::{PartUploader, PoolOptions, UploadWorkerPool};
pub use progress::SpeedCalculator;
pub use reader::PartReader;
pub use types::{ChunkResult, CompletionManifest, PartProgress};

/// Minimum chunk size: 256 KiB.
pub const DEFAULT_CHUNK_FLOOR: u64 = 1 << 18;

/// Default number of upload workers.
pub const DEFAULT_WORKERS: usize = 16;

/// Default attempts per part before the transfer is aborted.
pub const DEFAULT_PART_ATTEMPTS: u32 = 3;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("part {part_number} failed after {attempts} attempt(s): {reason}")]
    PartFailed {
        part_number: u32,
        attempts: u32,
        reason: String,
    },

    #[error("remote error: {0}")]
    Remote(String),

    #[error("incomplete manifest: {0}")]
    IncompleteManifest(String),

    #[error("cancelled")]
    Cancelled,

    #[error("task join error: {0}")]
    Join(String),
}
