use super::StatisticsExtractor;
use crate::statistics::CellStatistics;

/// Masked mean, median and standard deviation over every usable sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainExtractor;

impl StatisticsExtractor for PlainExtractor {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn reduce_cell(&self, values: &mut [f64]) -> CellStatistics {
        CellStatistics::from_values(values)
    }
}
