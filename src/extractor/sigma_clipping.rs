use serde::{Deserialize, Serialize};

use super::StatisticsExtractor;
use crate::error::ConfigurationError;
use crate::statistics::{CellStatistics, RunningStats};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigmaClippingConfig {
    /// Samples below `mean - max_sigma_low * std` are rejected
    pub max_sigma_low: f64,
    /// Samples above `mean + max_sigma_high * std` are rejected
    pub max_sigma_high: f64,
    /// Upper bound on rejection passes; 0 disables clipping
    pub max_iterations: usize,
}

impl Default for SigmaClippingConfig {
    fn default() -> Self {
        Self {
            max_sigma_low: 4.0,
            max_sigma_high: 4.0,
            max_iterations: 5,
        }
    }
}

/// Iterative sigma clipping around the mean, applied to each cell on its own.
///
/// Each pass computes mean and standard deviation of the surviving samples
/// and rejects those outside `[mean - low * std, mean + high * std]`.
/// Iteration stops once a pass rejects nothing, after `max_iterations`
/// passes, or when a pass would reject every survivor; in the last case the
/// previous survivors are kept. Final statistics use the survivors only.
#[derive(Debug, Clone)]
pub struct SigmaClippingExtractor {
    config: SigmaClippingConfig,
}

impl SigmaClippingExtractor {
    pub fn new(config: SigmaClippingConfig) -> Result<Self, ConfigurationError> {
        for (name, value) in [
            ("max_sigma_low", config.max_sigma_low),
            ("max_sigma_high", config.max_sigma_high),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::InvalidSigma { name, value });
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SigmaClippingConfig {
        &self.config
    }

    /// Clip `values` in place; returns how many survivors sit at the front.
    fn clip(&self, values: &mut [f64]) -> usize {
        let mut len = values.len();
        for _ in 0..self.config.max_iterations {
            let stats: RunningStats = values[..len].iter().copied().collect();
            let std = stats.std_dev();
            if !std.is_finite() || std == 0.0 {
                break;
            }
            let low = stats.mean() - self.config.max_sigma_low * std;
            let high = stats.mean() + self.config.max_sigma_high * std;
            let within = |v: f64| v >= low && v <= high;

            let kept = values[..len].iter().filter(|&&v| within(v)).count();
            if kept == len || kept == 0 {
                break;
            }

            let mut write = 0;
            for read in 0..len {
                if within(values[read]) {
                    values.swap(write, read);
                    write += 1;
                }
            }
            len = write;
        }
        len
    }
}

impl StatisticsExtractor for SigmaClippingExtractor {
    fn name(&self) -> &'static str {
        "sigma-clipping"
    }

    fn reduce_cell(&self, values: &mut [f64]) -> CellStatistics {
        let survivors = self.clip(values);
        CellStatistics::from_values(&mut values[..survivors])
    }
}
