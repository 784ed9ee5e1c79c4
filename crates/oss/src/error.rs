use pikpak_signer::SignerError;

/// Errors from the object store client.
#[derive(Debug, thiserror::Error)]
pub enum OssError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OSS error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid XML: {0}")]
    Xml(String),

    #[error("no ETag returned for part {0}")]
    MissingETag(u32),

    #[error("signing failed: {0}")]
    Signer(#[from] SignerError),
}
