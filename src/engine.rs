use serde::{Deserialize, Serialize};

use crate::chunking;
use crate::error::ExtractionError;
use crate::extractor::{ExtractorKind, StatisticsExtractor};
use crate::series::SampleSeries;
use crate::statistics::{ChunkStatistics, StatisticsRecord};

pub const DEFAULT_COLUMN: &str = "image";

/// Everything needed for one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Sample column to reduce
    #[serde(default = "default_column")]
    pub column: String,
    /// Samples per chunk
    pub chunk_size: usize,
    /// Stride between chunk starts, defaults to `chunk_size`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_shift: Option<usize>,
    /// Reducer selection, e.g. `{"strategy": "plain"}`
    #[serde(default)]
    pub extractor: ExtractorKind,
}

fn default_column() -> String {
    DEFAULT_COLUMN.to_string()
}

impl ExtractionConfig {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            column: default_column(),
            chunk_size,
            chunk_shift: None,
            extractor: ExtractorKind::default(),
        }
    }

    pub fn extract(&self, series: &SampleSeries) -> Result<ChunkStatistics, ExtractionError> {
        let extractor = self.extractor.build()?;
        extract(
            series,
            &self.column,
            self.chunk_size,
            self.chunk_shift,
            extractor.as_ref(),
        )
    }
}

/// Compute chunk-wise statistics of `column_name`.
///
/// Each record is keyed by the timestamp of its chunk's first sample.
/// Chunking parameters are validated before any reduction runs; cells
/// without usable samples come back as NaN rather than failing the call.
pub fn extract(
    series: &SampleSeries,
    column_name: &str,
    chunk_size: usize,
    chunk_shift: Option<usize>,
    extractor: &dyn StatisticsExtractor,
) -> Result<ChunkStatistics, ExtractionError> {
    let column = series
        .column(column_name)
        .ok_or_else(|| ExtractionError::UnknownColumn(column_name.to_string()))?;
    let chunks = chunking::plan(series.len(), chunk_size, chunk_shift)?;

    tracing::debug!(
        "Extracting '{}' with {} extractor: {} chunks of {} samples",
        column_name,
        extractor.name(),
        chunks.len(),
        chunk_size
    );

    let timestamps = series.timestamps();
    let mut results = ChunkStatistics::default();
    for chunk in chunks {
        let cells = extractor.reduce(&column.window(chunk.range()));
        let record = StatisticsRecord::from_cells(
            timestamps[chunk.start],
            timestamps[chunk.end - 1],
            &cells,
        );

        let invalid = record.invalid_cells().len();
        if invalid > 0 {
            tracing::warn!(
                "Chunk starting at {} has {} cells without usable samples",
                timestamps[chunk.start],
                invalid
            );
        } else {
            tracing::debug!("Chunk {}..{} reduced", chunk.start, chunk.end);
        }

        results.insert(timestamps[chunk.start], record);
    }

    tracing::info!(
        "Extracted {} chunk statistics from {} samples of '{}'",
        results.len(),
        series.len(),
        column_name
    );
    Ok(results)
}
