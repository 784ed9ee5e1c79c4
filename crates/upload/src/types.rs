//! Data types for the upload flow.

use std::time::Duration;

/// Progress event emitted during an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// File fingerprinted and registered with the drive.
    Checked { name: String, size: u64, hash: String },
    /// The drive already holds identical content; nothing is transferred.
    Deduplicated { file_id: String },
    /// Multipart upload opened.
    Initiated {
        file_id: String,
        upload_id: String,
        parts: u64,
        chunk_size: u64,
    },
    /// One part acknowledged by the object store.
    PartUploaded {
        part_number: u32,
        uploaded_bytes: u64,
        total_bytes: u64,
        bytes_per_second: f64,
        /// Time left at the current speed; `None` until it is known.
        eta: Option<Duration>,
    },
    /// Upload finished; the file is available under `file_id`.
    Completed { file_id: String },
    /// Upload failed.
    Failed { error: String },
}
