use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use pikpak_protocol::UploadTarget;
use pikpak_transfer::{PartUploader, TransferError};

use crate::OssClient;

/// One initiated multipart upload, handed to the worker pool.
pub struct MultipartSession {
    client: OssClient,
    target: Arc<UploadTarget>,
    upload_id: String,
}

impl MultipartSession {
    pub fn new(client: OssClient, target: Arc<UploadTarget>, upload_id: String) -> Self {
        Self {
            client,
            target,
            upload_id,
        }
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn target(&self) -> &UploadTarget {
        &self.target
    }
}

impl PartUploader for MultipartSession {
    fn upload_part(
        &self,
        part_number: u32,
        data: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<String, TransferError>> + Send + '_>> {
        Box::pin(async move {
            self.client
                .upload_part(&self.target, &self.upload_id, part_number, data)
                .await
                .map_err(|e| TransferError::Remote(e.to_string()))
        })
    }
}
