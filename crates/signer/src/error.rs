//! Signer error types.

/// Errors produced while signing.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("invalid salt table: {0}")]
    SaltTable(#[from] serde_json::Error),

    #[error("salt table has no supported steps")]
    EmptySaltTable,
}
