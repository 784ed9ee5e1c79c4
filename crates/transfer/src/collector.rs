use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::TransferError;
use crate::types::ChunkResult;

/// Drains the worker result channel on a dedicated task.
///
/// The channel closes once every sender is dropped; [`finish`](Self::finish)
/// must only be awaited after all workers have been joined.
pub struct ResultCollector {
    handle: JoinHandle<Vec<ChunkResult>>,
}

impl ResultCollector {
    /// Spawns the drain task.
    pub fn spawn(mut rx: mpsc::Receiver<ChunkResult>) -> Self {
        let handle = tokio::spawn(async move {
            let mut done = Vec::new();
            while let Some(result) = rx.recv().await {
                done.push(result);
            }
            debug!(parts = done.len(), "result channel drained");
            done
        });
        Self { handle }
    }

    /// Waits for the drain task and returns results sorted by part number.
    pub async fn finish(self) -> Result<Vec<ChunkResult>, TransferError> {
        let mut results = self
            .handle
            .await
            .map_err(|e| TransferError::Join(e.to_string()))?;
        results.sort_by_key(|r| r.part_number);
        Ok(results)
    }
}
