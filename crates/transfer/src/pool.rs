//! Strided worker pool uploading every part exactly once.
//!
//! Worker `i` of `W` owns indices `i, i+W, i+2W, …`, so there is no shared
//! work queue. Results flow over one bounded channel to a
//! [`ResultCollector`]. Shutdown runs in a fixed order: workers joined,
//! channel closed, collector joined, results read.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collector::ResultCollector;
use crate::plan::ChunkPlan;
use crate::reader::PartReader;
use crate::types::{ChunkResult, CompletionManifest, PartProgress};
use crate::{DEFAULT_PART_ATTEMPTS, TransferError};

/// Sends one part to the object store.
///
/// Implementations sign and send the request and return the store-issued
/// tag. Using a trait keeps the pool independent of the HTTP client and
/// testable with mocks.
pub trait PartUploader: Send + Sync {
    fn upload_part(
        &self,
        part_number: u32,
        data: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<String, TransferError>> + Send + '_>>;
}

/// Retry behaviour of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Attempts per part (read + upload) before the transfer is aborted.
    pub part_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_backoff`.
    pub retry_backoff: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            part_attempts: DEFAULT_PART_ATTEMPTS,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Uploads every part of a [`ChunkPlan`] with a fixed number of workers.
pub struct UploadWorkerPool {
    plan: ChunkPlan,
    options: PoolOptions,
    cancel: CancellationToken,
    progress_tx: Option<mpsc::Sender<PartProgress>>,
}

impl UploadWorkerPool {
    pub fn new(plan: ChunkPlan, options: PoolOptions) -> Self {
        Self {
            plan,
            options,
            cancel: CancellationToken::new(),
            progress_tx: None,
        }
    }

    /// Uses `cancel` to stop the transfer from outside.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reports each acknowledged part on `tx`.
    ///
    /// Every part is reported, so the receiver must be drained while the
    /// pool runs; a full channel stalls the workers. A dropped receiver is
    /// ignored.
    pub fn with_progress(mut self, tx: mpsc::Sender<PartProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    /// Runs the transfer and returns the validated manifest.
    ///
    /// The first unrecoverable part failure cancels the remaining workers
    /// and is returned; a manifest with gaps is never produced.
    pub async fn run(
        &self,
        reader: PartReader,
        uploader: Arc<dyn PartUploader>,
    ) -> Result<CompletionManifest, TransferError> {
        let chunk_count = self.plan.chunk_count();
        let workers = self.plan.active_workers();

        info!(
            file_size = self.plan.file_size(),
            chunk_size = self.plan.chunk_size(),
            parts = chunk_count,
            workers,
            "starting part upload"
        );

        let (tx, rx) = mpsc::channel::<ChunkResult>(workers.max(1));
        let collector = ResultCollector::spawn(rx);
        // Siblings are stopped through a child so a failure never cancels
        // the caller's token.
        let cancel = self.cancel.child_token();

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let worker = Worker {
                id,
                plan: self.plan,
                options: self.options,
                reader: reader.clone(),
                uploader: Arc::clone(&uploader),
                tx: tx.clone(),
                cancel: cancel.clone(),
                progress_tx: self.progress_tx.clone(),
            };
            handles.push(tokio::spawn(worker.run()));
        }
        drop(tx);

        let mut failure: Option<TransferError> = None;
        for handle in handles {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(TransferError::Join(e.to_string())),
            };
            if let Err(e) = outcome {
                record_failure(&mut failure, e);
            }
        }

        // Every sender is gone now, so the collector sees a closed channel.
        let results = collector.finish().await?;

        if let Some(e) = failure {
            return Err(e);
        }
        if self.cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        CompletionManifest::from_results(results, chunk_count)
    }
}

/// Keeps the most informative error: a real failure beats `Cancelled`.
fn record_failure(slot: &mut Option<TransferError>, err: TransferError) {
    let replace = match slot {
        None => true,
        Some(TransferError::Cancelled) => !matches!(err, TransferError::Cancelled),
        Some(_) => false,
    };
    if replace {
        *slot = Some(err);
    }
}

struct Worker {
    id: usize,
    plan: ChunkPlan,
    options: PoolOptions,
    reader: PartReader,
    uploader: Arc<dyn PartUploader>,
    tx: mpsc::Sender<ChunkResult>,
    cancel: CancellationToken,
    progress_tx: Option<mpsc::Sender<PartProgress>>,
}

impl Worker {
    async fn run(self) -> Result<(), TransferError> {
        for index in self.plan.assigned_to(self.id) {
            if self.cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }

            let part_number = u32::try_from(index + 1).map_err(|_| {
                TransferError::IncompleteManifest(format!("part index {index} out of range"))
            })?;
            let (offset, len) = self.plan.part_range(index);

            let etag = self.upload_with_retry(part_number, offset, len).await?;
            debug!(worker = self.id, part = part_number, bytes = len, "part uploaded");

            self.tx
                .send(ChunkResult { part_number, etag })
                .await
                .map_err(|_| TransferError::Cancelled)?;

            if let Some(ref progress) = self.progress_tx {
                let _ = progress
                    .send(PartProgress {
                        part_number,
                        bytes: len,
                    })
                    .await;
            }
        }
        Ok(())
    }

    async fn upload_with_retry(
        &self,
        part_number: u32,
        offset: u64,
        len: usize,
    ) -> Result<String, TransferError> {
        let attempts = self.options.part_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(TransferError::Cancelled),
                result = self.attempt(part_number, offset, len) => result,
            };

            match outcome {
                Ok(etag) => return Ok(etag),
                Err(TransferError::Cancelled) => return Err(TransferError::Cancelled),
                Err(e) if attempt < attempts => {
                    warn!(
                        worker = self.id,
                        part = part_number,
                        attempt,
                        error = %e,
                        "part failed, retrying"
                    );
                    let delay = self.options.retry_backoff * attempt;
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(TransferError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => {
                    self.cancel.cancel();
                    return Err(TransferError::PartFailed {
                        part_number,
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn attempt(
        &self,
        part_number: u32,
        offset: u64,
        len: usize,
    ) -> Result<String, TransferError> {
        let data = self.reader.read_part(offset, len).await?;
        self.uploader.upload_part(part_number, data).await
    }
}
