use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::TransferError;

/// Shared read-only file handle for positioned part reads.
///
/// Every read names its own offset, so workers never share a cursor and
/// the handle can be used from many tasks at once.
#[derive(Debug, Clone)]
pub struct PartReader {
    file: Arc<File>,
    path: PathBuf,
    file_size: u64,
}

impl PartReader {
    /// Opens `path` and records its current size.
    pub fn open(path: &Path) -> Result<Self, TransferError> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        Ok(Self {
            file: Arc::new(file),
            path: path.to_path_buf(),
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size captured when the reader was opened.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Reads exactly `len` bytes at `offset` on the calling thread.
    ///
    /// A file that shrank since it was opened yields `UnexpectedEof`.
    pub fn read_part_blocking(&self, offset: u64, len: usize) -> Result<Vec<u8>, TransferError> {
        let mut buf = vec![0u8; len];
        read_exact_at(&self.file, &mut buf, offset)?;
        Ok(buf)
    }

    /// Reads exactly `len` bytes at `offset` on the blocking pool.
    pub async fn read_part(&self, offset: u64, len: usize) -> Result<Vec<u8>, TransferError> {
        let reader = self.clone();
        tokio::task::spawn_blocking(move || reader.read_part_blocking(offset, len))
            .await
            .map_err(|e| TransferError::Join(e.to_string()))?
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    std::os::unix::fs::FileExt::read_exact_at(file, buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ));
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
