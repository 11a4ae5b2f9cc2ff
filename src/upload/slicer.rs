//! Byte-range planning for multipart uploads

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::error::{Result, UploadError};

/// Half-open byte range `[start, end)` within an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Range usable for indexing an in-memory payload
    pub fn as_usize(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// Split `total_size` bytes into exactly `part_count` ordered ranges.
///
/// Every range but the last is `ceil(total_size / part_count)` bytes; the last
/// one holds the remainder. When there are more parts than bytes the trailing
/// ranges are empty and sit at `total_size`, so the ranges always tile
/// `[0, total_size)`.
pub fn slice(total_size: u64, part_count: usize) -> Result<Vec<ByteRange>> {
    if part_count == 0 {
        return Err(UploadError::InvalidPlan {
            reason: "part count must be at least 1".into(),
        });
    }

    let parts = part_count as u64;
    let chunk_size = total_size.div_ceil(parts);

    let ranges = (0..parts)
        .map(|i| {
            let start = (i * chunk_size).min(total_size);
            let end = (start + chunk_size).min(total_size);
            ByteRange::new(start, end)
        })
        .collect();

    Ok(ranges)
}
