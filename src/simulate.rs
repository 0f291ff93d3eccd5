//! Synthetic calibration series with Gaussian readings.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use nalgebra::DMatrix;
use rand::prelude::*;
use rand_distr::Normal;

use crate::series::SampleSeries;

#[derive(Debug, Clone)]
pub struct GaussianSeriesParams {
    pub samples: usize,
    pub channels: usize,
    pub pixels: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub start: DateTime<Utc>,
    /// Spacing between consecutive samples; must be positive
    pub interval: Duration,
}

impl Default for GaussianSeriesParams {
    fn default() -> Self {
        Self {
            samples: 5000,
            channels: 2,
            pixels: 1855,
            mean: 0.0,
            std_dev: 1.0,
            start: DateTime::<Utc>::UNIX_EPOCH,
            interval: Duration::milliseconds(1),
        }
    }
}

impl GaussianSeriesParams {
    /// Evenly spaced sample times from `start`; fails if any time is out of range.
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>> {
        (0..self.samples)
            .map(|i| {
                i32::try_from(i)
                    .ok()
                    .and_then(|n| self.interval.checked_mul(n))
                    .and_then(|offset| self.start.checked_add_signed(offset))
                    .with_context(|| {
                        format!(
                            "Timestamp of sample {} overflows ({} + {} x {})",
                            i, self.start, i, self.interval
                        )
                    })
            })
            .collect()
    }

    /// `samples` matrices of `channels x pixels` normally distributed readings.
    pub fn generate_values<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<DMatrix<f64>>> {
        if self.std_dev.is_nan() || self.std_dev < 0.0 {
            bail!("Invalid standard deviation: {}", self.std_dev);
        }
        let normal = Normal::new(self.mean, self.std_dev)
            .with_context(|| format!("Invalid standard deviation: {}", self.std_dev))?;
        Ok((0..self.samples)
            .map(|_| DMatrix::from_fn(self.channels, self.pixels, |_, _| normal.sample(rng)))
            .collect())
    }

    /// Series with a single Gaussian column named `column`.
    pub fn generate<R: Rng + ?Sized>(&self, column: &str, rng: &mut R) -> Result<SampleSeries> {
        let values = self.generate_values(rng)?;
        let series = SampleSeries::new(self.timestamps()?)?.with_column(column, values)?;
        Ok(series)
    }
}
