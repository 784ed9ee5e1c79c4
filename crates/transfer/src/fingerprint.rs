//! Content fingerprint ("gcid") used by the drive to detect duplicates.
//!
//! The file is hashed in fixed blocks with SHA-1; the fingerprint is the
//! SHA-1 of the concatenated block digests, upper-case hex.

use std::io::Read;
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::TransferError;

/// Block size for a file of `file_size` bytes (256 KiB up to 2 MiB).
pub fn gcid_block_size(file_size: u64) -> u64 {
    match file_size {
        0..=0x800_0000 => 0x4_0000,
        0x800_0001..=0x1000_0000 => 0x8_0000,
        0x1000_0001..=0x2000_0000 => 0x10_0000,
        _ => 0x20_0000,
    }
}

/// Computes the fingerprint of everything readable from `reader`.
pub fn gcid_from_reader(mut reader: impl Read, file_size: u64) -> Result<String, TransferError> {
    let block_size = gcid_block_size(file_size) as usize;
    let mut outer = Sha1::new();
    let mut buf = vec![0u8; block_size];

    loop {
        let n = fill_block(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }
        outer.update(Sha1::digest(&buf[..n]));
        if n < block_size {
            break;
        }
    }

    Ok(hex::encode_upper(outer.finalize()))
}

/// Computes the fingerprint of the file at `path`.
pub fn gcid_from_path(path: &Path) -> Result<String, TransferError> {
    let file = std::fs::File::open(path)?;
    let file_size = file.metadata()?.len();
    gcid_from_reader(std::io::BufReader::new(file), file_size)
}

/// Reads until `buf` is full or EOF; returns the bytes read.
fn fill_block(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize, TransferError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
