//! Client for the OSS-compatible multipart upload protocol used by the
//! drive's object store.
//!
//! Every request is signed with the STS credentials of its
//! [`UploadTarget`](pikpak_protocol::UploadTarget).

mod client;
mod error;
mod session;

pub use client::OssClient;
pub use error::OssError;
pub use session::MultipartSession;

#[cfg(test)]
mod test_support;
