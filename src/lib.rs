pub mod chunking;
pub mod cli;
pub mod commands;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod series;
pub mod simulate;
pub mod statistics;
pub mod utils;

#[cfg(test)]
mod test_extraction;

// Re-export commonly used items
pub use engine::{extract, ExtractionConfig};
pub use error::{ConfigurationError, ExtractionError, SeriesError};
pub use extractor::{
    ExtractorKind, PlainExtractor, SigmaClippingConfig, SigmaClippingExtractor,
    StatisticsExtractor,
};
pub use series::SampleSeries;
pub use statistics::{ChunkStatistics, StatisticsRecord};
