use crate::error::ConfigurationError;

/// A contiguous `[start, end)` index range into a sample series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Never true for chunks returned by [`plan`], which requires `chunk_size >= 1`.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Plan the chunks covering `total_length` samples.
///
/// Chunks start at index 0 and advance by `chunk_shift` (default:
/// `chunk_size`). A trailing chunk that would run past the end is dropped
/// rather than truncated, so every chunk holds exactly `chunk_size` samples
/// and no sample contributes to more than one chunk.
pub fn plan(
    total_length: usize,
    chunk_size: usize,
    chunk_shift: Option<usize>,
) -> Result<Vec<Chunk>, ConfigurationError> {
    if chunk_size == 0 {
        return Err(ConfigurationError::ZeroChunkSize);
    }
    if chunk_size > total_length {
        return Err(ConfigurationError::ChunkSizeExceedsSamples {
            chunk_size,
            available: total_length,
        });
    }
    let chunk_shift = chunk_shift.unwrap_or(chunk_size);
    if chunk_shift < chunk_size {
        return Err(ConfigurationError::ChunkShiftTooSmall {
            chunk_shift,
            chunk_size,
        });
    }

    let chunks = (0..=total_length - chunk_size)
        .step_by(chunk_shift)
        .map(|start| Chunk {
            start,
            end: start + chunk_size,
        })
        .collect();
    Ok(chunks)
}
