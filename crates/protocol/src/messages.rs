use serde::{Deserialize, Serialize};

use crate::constants::{KIND_FILE, OBJ_PROVIDER_UNKNOWN, UPLOAD_TYPE_RESUMABLE};
use crate::types::{Phase, UploadTarget};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Registers a file entry and requests an upload target (`POST /drive/v1/files`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFileRequest {
    pub kind: String,
    pub name: String,
    /// Decimal byte count; the drive expects a string.
    pub size: String,
    /// Content fingerprint (gcid).
    pub hash: String,
    pub upload_type: String,
    #[serde(rename = "objProvider")]
    pub obj_provider: ObjProvider,
    pub body: MediaBody,
    /// Absent means the drive's default upload folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl CreateFileRequest {
    /// Builds a resumable upload request for a regular file.
    pub fn resumable(name: &str, size: u64, hash: &str, parent_id: Option<&str>) -> Self {
        Self {
            kind: KIND_FILE.into(),
            name: name.into(),
            size: size.to_string(),
            hash: hash.into(),
            upload_type: UPLOAD_TYPE_RESUMABLE.into(),
            obj_provider: ObjProvider {
                provider: OBJ_PROVIDER_UNKNOWN.into(),
            },
            body: MediaBody::default(),
            parent_id: parent_id.filter(|id| !id.is_empty()).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjProvider {
    pub provider: String,
}

/// Media attributes; always empty for plain uploads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaBody {
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub width: String,
    #[serde(default)]
    pub height: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Response of the file creation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateFileResponse {
    #[serde(default)]
    pub file: FileInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resumable: Option<Resumable>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upload_type: String,
}

impl CreateFileResponse {
    /// Returns the upload target when the drive issued one.
    pub fn upload_target(&self) -> Option<&UploadTarget> {
        self.resumable.as_ref().map(|r| &r.params)
    }
}

/// File entry as reported by the drive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub phase: String,
}

impl FileInfo {
    /// Returns the parsed upload phase.
    pub fn phase(&self) -> Phase {
        Phase::parse(&self.phase)
    }
}

/// Resumable upload descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resumable {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub params: UploadTarget,
}

/// Error body returned by the drive and the user service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

impl ApiErrorBody {
    /// Best human-readable message available.
    pub fn message(&self) -> &str {
        if self.error_description.is_empty() {
            &self.error
        } else {
            &self.error_description
        }
    }
}
