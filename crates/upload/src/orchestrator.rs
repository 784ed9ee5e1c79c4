//! Upload orchestrator.
//!
//! Drives one file through check, initiate, transfer and finalize, emits
//! progress events and supports cancellation.

use std::path::Path;
use std::sync::Arc;

use pikpak_protocol::{CreateFileRequest, Phase};
use pikpak_transfer::{
    ChunkPlan, PartProgress, PartReader, SpeedCalculator, TransferError, UploadWorkerPool,
    gcid_from_path,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::backend::{DriveApi, ObjectStore};
use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::types::UploadEvent;

/// Uploads local files to the drive.
pub struct UploadOrchestrator {
    config: UploadConfig,
    drive: Arc<dyn DriveApi>,
    store: Arc<dyn ObjectStore>,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: CancellationToken,
}

impl UploadOrchestrator {
    pub fn new(
        config: UploadConfig,
        drive: Arc<dyn DriveApi>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            config,
            drive,
            store,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for uploads run by this orchestrator.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Uploads `path` into `parent_id` (the drive's default folder when
    /// `None`) and returns the drive file id.
    ///
    /// Content the drive already holds is not transferred again.
    pub async fn upload_file(
        &self,
        path: &Path,
        parent_id: Option<&str>,
    ) -> Result<String, UploadError> {
        match self.run(path, parent_id).await {
            Ok(file_id) => {
                self.emit(UploadEvent::Completed {
                    file_id: file_id.clone(),
                });
                info!(path = %path.display(), file_id = %file_id, "upload completed");
                Ok(file_id)
            }
            Err(e) => {
                let err_msg = e.to_string();
                self.emit(UploadEvent::Failed {
                    error: err_msg.clone(),
                });
                error!(path = %path.display(), error = %err_msg, "upload failed");
                Err(e)
            }
        }
    }

    async fn run(&self, path: &Path, parent_id: Option<&str>) -> Result<String, UploadError> {
        self.check_cancelled()?;

        // 1. Check
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(UploadError::InvalidPath(path.display().to_string()));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::InvalidPath(path.display().to_string()))?
            .to_string();
        let size = metadata.len();

        let hash = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || gcid_from_path(&path)
        })
        .await
        .map_err(|e| TransferError::Join(e.to_string()))??;

        debug!(name = %name, size, hash = %hash, "file fingerprinted");
        self.check_cancelled()?;

        let created = self
            .drive
            .create_file(CreateFileRequest::resumable(&name, size, &hash, parent_id))
            .await?;
        self.emit(UploadEvent::Checked {
            name: name.clone(),
            size,
            hash,
        });

        let file_id = created.file.id.clone();
        match created.file.phase() {
            Phase::Complete => {
                info!(name = %name, file_id = %file_id, "content already on drive");
                self.emit(UploadEvent::Deduplicated {
                    file_id: file_id.clone(),
                });
                return Ok(file_id);
            }
            Phase::Pending => {}
            Phase::Other(phase) => return Err(UploadError::UnexpectedPhase(phase)),
        }

        let target = Arc::new(
            created
                .upload_target()
                .cloned()
                .ok_or(UploadError::MissingTarget)?,
        );

        // 2. Initiate
        self.check_cancelled()?;
        let upload_id = self.store.initiate(Arc::clone(&target)).await?;

        // 3. Transfer
        let reader = PartReader::open(path)?;
        let plan = ChunkPlan::new(
            reader.file_size(),
            self.config.chunk_floor,
            self.config.workers,
        );
        self.emit(UploadEvent::Initiated {
            file_id: file_id.clone(),
            upload_id: upload_id.clone(),
            parts: plan.chunk_count(),
            chunk_size: plan.chunk_size(),
        });

        let (progress_tx, progress_rx) = mpsc::channel(plan.active_workers().max(1) * 2);
        let forwarder = self.spawn_progress_forwarder(progress_rx, plan.file_size());

        let pool = UploadWorkerPool::new(plan, self.config.pool_options())
            .with_cancel(self.cancel.clone())
            .with_progress(progress_tx);
        let uploader = self.store.part_uploader(Arc::clone(&target), &upload_id);
        let transferred = pool.run(reader, uploader).await;

        // Closing the progress channel lets the forwarder finish.
        drop(pool);
        let _ = forwarder.await;
        let manifest = transferred?;

        // 4. Finalize
        self.store.complete(target, upload_id, manifest).await?;

        Ok(file_id)
    }

    fn spawn_progress_forwarder(
        &self,
        mut rx: mpsc::Receiver<PartProgress>,
        total_bytes: u64,
    ) -> JoinHandle<()> {
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let speed = SpeedCalculator::default();
            let mut uploaded_bytes = 0u64;
            while let Some(progress) = rx.recv().await {
                let bytes = progress.bytes as u64;
                uploaded_bytes += bytes;
                speed.add_sample(bytes);
                // Every part arrives here; only the event hop may drop.
                let _ = events_tx.try_send(UploadEvent::PartUploaded {
                    part_number: progress.part_number,
                    uploaded_bytes,
                    total_bytes,
                    bytes_per_second: speed.bytes_per_second(),
                    eta: speed.eta(total_bytes.saturating_sub(uploaded_bytes)),
                });
            }
        })
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Best effort; events are dropped when nobody drains the channel.
    fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.try_send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::io::Write;
    use std::path::PathBuf;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::time::Duration;

    use pikpak_oss::OssError;
    use pikpak_protocol::{CreateFileResponse, FileInfo, Resumable, UploadTarget};
    use pikpak_transfer::{CompletionManifest, PartUploader};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Mock drive returning one canned response per call.
    struct MockDrive {
        responses: Mutex<Vec<CreateFileResponse>>,
        requests: Mutex<Vec<CreateFileRequest>>,
    }

    impl MockDrive {
        fn new(responses: Vec<CreateFileResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl DriveApi for MockDrive {
        fn create_file(
            &self,
            request: CreateFileRequest,
        ) -> Pin<Box<dyn Future<Output = Result<CreateFileResponse, UploadError>> + Send + '_>>
        {
            self.requests.lock().unwrap().push(request);
            Box::pin(async move {
                let mut responses = self.responses.lock().unwrap();
                if responses.is_empty() {
                    Err(UploadError::Drive(pikpak_drive::DriveError::Status {
                        status: 500,
                        body: "no mock response available".into(),
                    }))
                } else {
                    Ok(responses.remove(0))
                }
            })
        }
    }

    /// Mock object store recording every call in order.
    #[derive(Default)]
    struct MockStore {
        log: Log,
        fail_part: Option<u32>,
        fail_complete: bool,
        completed: Mutex<Option<CompletionManifest>>,
        part_sizes: Arc<Mutex<Vec<(u32, usize)>>>,
    }

    impl MockStore {
        fn calls(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    struct MockParts {
        log: Log,
        fail_part: Option<u32>,
        part_sizes: Arc<Mutex<Vec<(u32, usize)>>>,
    }

    impl PartUploader for MockParts {
        fn upload_part(
            &self,
            part_number: u32,
            data: Vec<u8>,
        ) -> Pin<Box<dyn Future<Output = Result<String, TransferError>> + Send + '_>> {
            Box::pin(async move {
                if self.fail_part == Some(part_number) {
                    return Err(TransferError::Remote("500 InternalError".into()));
                }
                self.log.lock().unwrap().push(format!("part:{part_number}"));
                self.part_sizes
                    .lock()
                    .unwrap()
                    .push((part_number, data.len()));
                Ok(format!("etag-{part_number}"))
            })
        }
    }

    impl ObjectStore for MockStore {
        fn initiate(
            &self,
            target: Arc<UploadTarget>,
        ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + '_>> {
            self.log
                .lock()
                .unwrap()
                .push(format!("initiate:{}", target.key));
            Box::pin(async move { Ok("UP-1".to_string()) })
        }

        fn part_uploader(
            &self,
            _target: Arc<UploadTarget>,
            upload_id: &str,
        ) -> Arc<dyn PartUploader> {
            assert_eq!(upload_id, "UP-1");
            Arc::new(MockParts {
                log: Arc::clone(&self.log),
                fail_part: self.fail_part,
                part_sizes: Arc::clone(&self.part_sizes),
            })
        }

        fn complete(
            &self,
            _target: Arc<UploadTarget>,
            upload_id: String,
            manifest: CompletionManifest,
        ) -> Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + '_>> {
            Box::pin(async move {
                self.log
                    .lock()
                    .unwrap()
                    .push(format!("complete:{upload_id}:{}", manifest.len()));
                if self.fail_complete {
                    return Err(UploadError::Oss(OssError::Api {
                        status: 400,
                        body: "InvalidPart".into(),
                    }));
                }
                *self.completed.lock().unwrap() = Some(manifest);
                Ok(())
            })
        }
    }

    fn file_info(id: &str, phase: &str) -> FileInfo {
        FileInfo {
            id: id.into(),
            name: "payload.bin".into(),
            kind: "drive#file".into(),
            parent_id: String::new(),
            phase: phase.into(),
        }
    }

    fn pending_response() -> CreateFileResponse {
        CreateFileResponse {
            file: file_info("VN-NEW", "PHASE_TYPE_PENDING"),
            resumable: Some(Resumable {
                kind: "drive#resumable".into(),
                provider: "PROVIDER_ALIYUN".into(),
                params: UploadTarget {
                    bucket: "bucket".into(),
                    access_key_id: "AKID".into(),
                    access_key_secret: "secret".into(),
                    endpoint: "oss.example.com".into(),
                    key: "obj/key".into(),
                    security_token: "sts".into(),
                },
            }),
            upload_type: "UPLOAD_TYPE_RESUMABLE".into(),
        }
    }

    fn complete_response() -> CreateFileResponse {
        CreateFileResponse {
            file: file_info("VN-OLD", "PHASE_TYPE_COMPLETE"),
            ..CreateFileResponse::default()
        }
    }

    fn write_file(dir: &Path, size: usize) -> PathBuf {
        let path = dir.join("payload.bin");
        let data: Vec<u8> = (0..size).map(|i| (i % 239) as u8).collect();
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&data)
            .unwrap();
        path
    }

    fn test_config(workers: usize) -> UploadConfig {
        UploadConfig {
            workers,
            retry_backoff: Duration::from_millis(1),
            ..UploadConfig::default()
        }
    }

    fn orchestrator(
        workers: usize,
        drive: Arc<MockDrive>,
        store: Arc<MockStore>,
    ) -> UploadOrchestrator {
        UploadOrchestrator::new(test_config(workers), drive, store)
    }

    async fn drain(mut rx: mpsc::Receiver<UploadEvent>) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        events
    }

    #[tokio::test]
    async fn complete_phase_skips_object_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), 4096);

        let drive = Arc::new(MockDrive::new(vec![complete_response()]));
        let store = Arc::new(MockStore::default());
        let mut orch = orchestrator(16, Arc::clone(&drive), Arc::clone(&store));
        let events_rx = orch.take_events().unwrap();

        let file_id = orch.upload_file(&path, None).await.unwrap();

        assert_eq!(file_id, "VN-OLD");
        assert!(store.calls().is_empty());
        let events = drain(events_rx).await;
        assert!(events.contains(&UploadEvent::Deduplicated {
            file_id: "VN-OLD".into()
        }));
        assert!(events.contains(&UploadEvent::Completed {
            file_id: "VN-OLD".into()
        }));
    }

    #[tokio::test]
    async fn pending_uploads_all_parts_before_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), 1_000_000);

        let drive = Arc::new(MockDrive::new(vec![pending_response()]));
        let store = Arc::new(MockStore::default());
        let orch = orchestrator(16, Arc::clone(&drive), Arc::clone(&store));

        let file_id = orch.upload_file(&path, Some("parent-1")).await.unwrap();
        assert_eq!(file_id, "VN-NEW");

        // Create request describes the file.
        let requests = drive.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "payload.bin");
        assert_eq!(requests[0].size, "1000000");
        assert_eq!(requests[0].hash, gcid_from_path(&path).unwrap());
        assert_eq!(requests[0].parent_id.as_deref(), Some("parent-1"));

        // initiate → 4 parts in any order → complete.
        let calls = store.calls();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[0], "initiate:obj/key");
        assert_eq!(calls[5], "complete:UP-1:4");
        let mut parts = calls[1..5].to_vec();
        parts.sort();
        assert_eq!(parts, vec!["part:1", "part:2", "part:3", "part:4"]);

        let mut sizes = store.part_sizes.lock().unwrap().clone();
        sizes.sort_unstable();
        assert_eq!(
            sizes,
            vec![
                (1, 262_144),
                (2, 262_144),
                (3, 262_144),
                (4, 1_000_000 - 3 * 262_144)
            ]
        );

        let manifest = store.completed.lock().unwrap().clone().unwrap();
        let tags: Vec<&str> = manifest.parts().iter().map(|p| p.etag.as_str()).collect();
        assert_eq!(tags, vec!["etag-1", "etag-2", "etag-3", "etag-4"]);
    }

    #[tokio::test]
    async fn worker_count_does_not_change_finalized_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), 3 * 262_144 + 17);

        let mut manifests = Vec::new();
        for workers in [1, 16] {
            let drive = Arc::new(MockDrive::new(vec![pending_response()]));
            let store = Arc::new(MockStore::default());
            orchestrator(workers, drive, Arc::clone(&store))
                .upload_file(&path, None)
                .await
                .unwrap();
            manifests.push(store.completed.lock().unwrap().clone().unwrap());
        }
        assert_eq!(manifests[0].len(), 4);
        assert_eq!(manifests[0], manifests[1]);
    }

    #[tokio::test]
    async fn missing_file_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let drive = Arc::new(MockDrive::new(vec![pending_response()]));
        let store = Arc::new(MockStore::default());
        let orch = orchestrator(16, Arc::clone(&drive), Arc::clone(&store));

        let err = orch
            .upload_file(&dir.path().join("missing.bin"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Io(_)), "{err}");
        assert_eq!(drive.request_count(), 0);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let drive = Arc::new(MockDrive::new(vec![pending_response()]));
        let orch = orchestrator(16, Arc::clone(&drive), Arc::new(MockStore::default()));

        let err = orch.upload_file(dir.path(), None).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidPath(_)), "{err}");
        assert_eq!(drive.request_count(), 0);
    }

    #[tokio::test]
    async fn pending_without_target_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), 100);

        let mut response = pending_response();
        response.resumable = None;
        let store = Arc::new(MockStore::default());
        let orch = orchestrator(16, Arc::new(MockDrive::new(vec![response])), Arc::clone(&store));

        let err = orch.upload_file(&path, None).await.unwrap_err();
        assert!(matches!(err, UploadError::MissingTarget), "{err}");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_phase_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), 100);

        let response = CreateFileResponse {
            file: file_info("VN-X", "PHASE_TYPE_ERROR"),
            ..CreateFileResponse::default()
        };
        let orch = orchestrator(
            16,
            Arc::new(MockDrive::new(vec![response])),
            Arc::new(MockStore::default()),
        );

        let err = orch.upload_file(&path, None).await.unwrap_err();
        match err {
            UploadError::UnexpectedPhase(phase) => assert_eq!(phase, "PHASE_TYPE_ERROR"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn failed_part_skips_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), 1_000_000);

        let store = Arc::new(MockStore {
            fail_part: Some(2),
            ..MockStore::default()
        });
        let mut orch = orchestrator(
            4,
            Arc::new(MockDrive::new(vec![pending_response()])),
            Arc::clone(&store),
        );
        let events_rx = orch.take_events().unwrap();

        let err = orch.upload_file(&path, None).await.unwrap_err();
        match err {
            UploadError::Transfer(TransferError::PartFailed {
                part_number,
                attempts,
                ..
            }) => {
                assert_eq!(part_number, 2);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!store.calls().iter().any(|c| c.starts_with("complete")));
        assert!(store.completed.lock().unwrap().is_none());

        let events = drain(events_rx).await;
        assert!(matches!(events.last(), Some(UploadEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn finalize_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), 1000);

        let store = Arc::new(MockStore {
            fail_complete: true,
            ..MockStore::default()
        });
        let orch = orchestrator(
            16,
            Arc::new(MockDrive::new(vec![pending_response()])),
            Arc::clone(&store),
        );

        let err = orch.upload_file(&path, None).await.unwrap_err();
        assert!(matches!(err, UploadError::Oss(OssError::Api { status: 400, .. })), "{err}");
        assert_eq!(store.calls().last().map(String::as_str), Some("complete:UP-1:1"));
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), 1000);

        let drive = Arc::new(MockDrive::new(vec![pending_response()]));
        let orch = orchestrator(16, Arc::clone(&drive), Arc::new(MockStore::default()));
        orch.cancel_token().cancel();

        let err = orch.upload_file(&path, None).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(drive.request_count(), 0);
    }

    #[tokio::test]
    async fn progress_events_cover_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), 1_000_000);

        let mut orch = orchestrator(
            16,
            Arc::new(MockDrive::new(vec![pending_response()])),
            Arc::new(MockStore::default()),
        );
        let events_rx = orch.take_events().unwrap();
        orch.upload_file(&path, None).await.unwrap();

        let events = drain(events_rx).await;
        let mut last_uploaded = 0;
        let mut last_eta = None;
        let mut part_events = 0;
        for event in &events {
            if let UploadEvent::PartUploaded {
                uploaded_bytes,
                total_bytes,
                eta,
                ..
            } = event
            {
                assert!(*uploaded_bytes > last_uploaded);
                assert_eq!(*total_bytes, 1_000_000);
                last_uploaded = *uploaded_bytes;
                last_eta = *eta;
                part_events += 1;
            }
        }
        assert_eq!(part_events, 4);
        assert_eq!(last_uploaded, 1_000_000);
        // Nothing is left once the last part is in.
        assert!(last_eta.is_none_or(|eta| eta.is_zero()));
        assert!(events.iter().any(|e| matches!(
            e,
            UploadEvent::Initiated { parts: 4, chunk_size: 262_144, .. }
        )));
    }

    #[tokio::test]
    async fn take_events_once() {
        let mut orch = orchestrator(
            1,
            Arc::new(MockDrive::new(Vec::new())),
            Arc::new(MockStore::default()),
        );
        assert!(orch.take_events().is_some());
        assert!(orch.take_events().is_none());
    }
}
