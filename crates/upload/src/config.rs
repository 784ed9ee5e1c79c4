use std::time::Duration;

use pikpak_transfer::{DEFAULT_CHUNK_FLOOR, DEFAULT_PART_ATTEMPTS, DEFAULT_WORKERS, PoolOptions};

/// Tuning of one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadConfig {
    /// Concurrent part uploads.
    pub workers: usize,
    /// Smallest chunk size in bytes.
    pub chunk_floor: u64,
    /// Attempts per part before the upload is aborted.
    pub part_attempts: u32,
    /// Base delay between attempts of one part.
    pub retry_backoff: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            chunk_floor: DEFAULT_CHUNK_FLOOR,
            part_attempts: DEFAULT_PART_ATTEMPTS,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl UploadConfig {
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            part_attempts: self.part_attempts,
            retry_backoff: self.retry_backoff,
        }
    }
}
