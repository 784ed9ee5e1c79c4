use std::fmt;

use serde::{Deserialize, Serialize};

/// Upload target issued by the drive for a pending file.
///
/// Carries the STS credentials for one object key. Shared read-only by
/// every part request of the upload.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub access_key_secret: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub security_token: String,
}

impl UploadTarget {
    /// Returns the canonical resource prefix `/{bucket}/{key}`.
    pub fn resource(&self) -> String {
        format!("/{}/{}", self.bucket, self.key)
    }
}

// Secrets stay out of logs.
impl fmt::Debug for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTarget")
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("key", &self.key)
            .field("security_token", &"<redacted>")
            .finish()
    }
}

/// Upload phase reported by the drive for a created file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Content already present server-side.
    Complete,
    /// Content must be uploaded to the returned target.
    Pending,
    /// Any phase this client does not handle.
    Other(String),
}

impl Phase {
    /// Parses the wire representation (`PHASE_TYPE_*`).
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PHASE_TYPE_COMPLETE" => Self::Complete,
            "PHASE_TYPE_PENDING" => Self::Pending,
            other => Self::Other(other.to_string()),
        }
    }
}
