//! Per-chunk statistics reducers.
//!
//! A reducer turns one chunk window of a sample column into per-cell
//! statistics. Only usable samples (mask set and finite value) of a cell
//! are handed to the reducer; a cell without any usable sample is reported
//! as [`CellStatistics::INVALID`] without consulting it.

pub mod plain;
pub mod sigma_clipping;

use bumpalo::Bump;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::series::ColumnView;
use crate::statistics::CellStatistics;

pub use plain::PlainExtractor;
pub use sigma_clipping::{SigmaClippingConfig, SigmaClippingExtractor};

pub trait StatisticsExtractor {
    fn name(&self) -> &'static str;

    /// Reduce the usable samples of one cell. `values` is never empty and
    /// may be reordered.
    fn reduce_cell(&self, values: &mut [f64]) -> CellStatistics;

    /// Reduce every (channel, pixel) cell of a chunk window independently.
    fn reduce(&self, chunk: &ColumnView<'_>) -> DMatrix<CellStatistics> {
        let Some((channels, pixels)) = chunk.shape() else {
            return DMatrix::from_element(0, 0, CellStatistics::INVALID);
        };

        // One scratch buffer per chunk, reused for every cell
        let arena = Bump::new();
        let mut scratch = bumpalo::collections::Vec::with_capacity_in(chunk.len(), &arena);

        DMatrix::from_fn(channels, pixels, |channel, pixel| {
            scratch.clear();
            scratch.extend(
                (0..chunk.len())
                    .filter(|&sample| chunk.is_usable(sample, channel, pixel))
                    .map(|sample| chunk.values[sample][(channel, pixel)]),
            );
            if scratch.is_empty() {
                CellStatistics::INVALID
            } else {
                self.reduce_cell(&mut scratch)
            }
        })
    }
}

/// Reducer selection, as found in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ExtractorKind {
    Plain,
    SigmaClipping(SigmaClippingConfig),
}

impl Default for ExtractorKind {
    fn default() -> Self {
        ExtractorKind::SigmaClipping(SigmaClippingConfig::default())
    }
}

impl ExtractorKind {
    pub fn build(&self) -> Result<Box<dyn StatisticsExtractor>, ConfigurationError> {
        Ok(match self {
            ExtractorKind::Plain => Box::new(PlainExtractor),
            ExtractorKind::SigmaClipping(config) => {
                Box::new(SigmaClippingExtractor::new(config.clone())?)
            }
        })
    }
}
