use pikpak_protocol::oss::{CompleteMultipartUpload, CompletePart};

use crate::TransferError;

/// Acknowledgement of one uploaded part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkResult {
    /// 1-based part number.
    pub part_number: u32,
    /// Tag returned by the object store (`ETag`, quotes trimmed).
    pub etag: String,
}

/// Progress notification sent after each acknowledged part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartProgress {
    pub part_number: u32,
    pub bytes: usize,
}

/// Parts of a finished transfer, strictly ascending and gap-free.
///
/// The only constructor validates that exactly one result exists for
/// every part number in `1..=chunk_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionManifest {
    parts: Vec<ChunkResult>,
}

impl CompletionManifest {
    /// Orders `results` and checks them against the expected part count.
    pub fn from_results(
        mut results: Vec<ChunkResult>,
        chunk_count: u64,
    ) -> Result<Self, TransferError> {
        results.sort_by_key(|r| r.part_number);

        for (i, result) in results.iter().enumerate() {
            let expected = i as u64 + 1;
            if u64::from(result.part_number) != expected {
                let reason = if i > 0 && results[i - 1].part_number == result.part_number {
                    format!("duplicate part {}", result.part_number)
                } else {
                    format!("missing part {expected}")
                };
                return Err(TransferError::IncompleteManifest(reason));
            }
        }

        let got = results.len() as u64;
        if got != chunk_count {
            return Err(TransferError::IncompleteManifest(format!(
                "expected {chunk_count} parts, got {got}"
            )));
        }

        Ok(Self { parts: results })
    }

    pub fn parts(&self) -> &[ChunkResult] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Builds the XML body of the completion request.
    pub fn to_complete_body(&self) -> CompleteMultipartUpload {
        CompleteMultipartUpload {
            parts: self
                .parts
                .iter()
                .map(|p| CompletePart {
                    part_number: p.part_number,
                    etag: p.etag.clone(),
                })
                .collect(),
        }
    }
}
