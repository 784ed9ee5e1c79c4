//! Upload error types.

use pikpak_drive::DriveError;
use pikpak_oss::OssError;
use pikpak_transfer::TransferError;

/// Errors produced while uploading a file.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not an uploadable file: {0}")]
    InvalidPath(String),

    #[error("drive error: {0}")]
    Drive(#[from] DriveError),

    #[error("object store error: {0}")]
    Oss(#[from] OssError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("drive returned no upload target")]
    MissingTarget,

    #[error("unexpected upload phase: {0}")]
    UnexpectedPhase(String),

    #[error("cancelled")]
    Cancelled,
}

impl UploadError {
    /// True when the upload stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Transfer(TransferError::Cancelled)
        )
    }
}
