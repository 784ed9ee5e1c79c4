use pikpak_protocol::constants::OSS_MAX_PARTS;

/// How a file is split into parts and spread over workers.
///
/// `chunk_size` never drops below the floor, and the part count never
/// exceeds [`OSS_MAX_PARTS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    chunk_size: u64,
    file_size: u64,
    workers: usize,
}

impl ChunkPlan {
    /// Plans `file_size` bytes with the given chunk floor and worker count.
    ///
    /// A zero floor or zero workers are raised to 1.
    pub fn new(file_size: u64, chunk_floor: u64, workers: usize) -> Self {
        let floor = chunk_floor.max(1);
        let chunk_size = file_size.div_ceil(OSS_MAX_PARTS).max(floor);
        Self {
            chunk_size,
            file_size,
            workers: workers.max(1),
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of parts: `ceil(file_size / chunk_size)`.
    pub fn chunk_count(&self) -> u64 {
        self.file_size.div_ceil(self.chunk_size)
    }

    /// Workers that have at least one part assigned.
    pub fn active_workers(&self) -> usize {
        let count = usize::try_from(self.chunk_count()).unwrap_or(usize::MAX);
        self.workers.min(count)
    }

    /// Byte offset and length of the part at 0-based `index`.
    pub fn part_range(&self, index: u64) -> (u64, usize) {
        let offset = index.saturating_mul(self.chunk_size);
        let len = self.chunk_size.min(self.file_size.saturating_sub(offset));
        (offset, len as usize)
    }

    /// Strided indices owned by `worker`: `worker, worker + W, worker + 2W, …`.
    pub fn assigned_to(&self, worker: usize) -> impl Iterator<Item = u64> + use<> {
        let count = self.chunk_count();
        (worker as u64..count).step_by(self.workers)
    }
}
