//! Remote services the upload flow talks to.
//!
//! The real clients implement these traits below. Using traits keeps the
//! flow decoupled from HTTP and testable with mocks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use pikpak_drive::DriveClient;
use pikpak_oss::{MultipartSession, OssClient};
use pikpak_protocol::{CreateFileRequest, CreateFileResponse, UploadTarget};
use pikpak_transfer::{CompletionManifest, PartUploader};

use crate::error::UploadError;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Drive metadata API.
pub trait DriveApi: Send + Sync {
    /// Registers a file entry; the response says whether content must be
    /// uploaded.
    fn create_file(&self, request: CreateFileRequest) -> BoxFuture<'_, CreateFileResponse>;
}

/// Object store accepting multipart uploads.
pub trait ObjectStore: Send + Sync {
    /// Opens a multipart upload and returns its id.
    fn initiate(&self, target: Arc<UploadTarget>) -> BoxFuture<'_, String>;

    /// Returns the part sender for an opened upload.
    fn part_uploader(&self, target: Arc<UploadTarget>, upload_id: &str) -> Arc<dyn PartUploader>;

    /// Finalizes the upload with every part in ascending order.
    fn complete(
        &self,
        target: Arc<UploadTarget>,
        upload_id: String,
        manifest: CompletionManifest,
    ) -> BoxFuture<'_, ()>;
}

impl DriveApi for DriveClient {
    fn create_file(&self, request: CreateFileRequest) -> BoxFuture<'_, CreateFileResponse> {
        Box::pin(async move { Ok(DriveClient::create_file(self, &request).await?) })
    }
}

impl ObjectStore for OssClient {
    fn initiate(&self, target: Arc<UploadTarget>) -> BoxFuture<'_, String> {
        Box::pin(async move { Ok(OssClient::initiate(self, &target).await?) })
    }

    fn part_uploader(&self, target: Arc<UploadTarget>, upload_id: &str) -> Arc<dyn PartUploader> {
        Arc::new(MultipartSession::new(
            self.clone(),
            target,
            upload_id.to_string(),
        ))
    }

    fn complete(
        &self,
        target: Arc<UploadTarget>,
        upload_id: String,
        manifest: CompletionManifest,
    ) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            Ok(OssClient::complete(self, &target, &upload_id, &manifest).await?)
        })
    }
}
