//! Wire protocol types for the PikPak drive API, the captcha shield
//! endpoint and the OSS-compatible multipart upload protocol.

pub mod captcha;
pub mod constants;
pub mod messages;
pub mod oss;
pub mod types;

// Re-export primary types for convenience.
pub use captcha::{CaptchaInitRequest, CaptchaInitResponse, CaptchaMeta};
pub use messages::{ApiErrorBody, CreateFileRequest, CreateFileResponse, FileInfo, Resumable};
pub use oss::{CompleteMultipartUpload, CompletePart, InitiateMultipartUploadResult};
pub use types::{Phase, UploadTarget};
