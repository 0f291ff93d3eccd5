use std::fs;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::cli::SimulateOptions;
use crate::series::SeriesFile;
use crate::simulate::GaussianSeriesParams;

pub fn simulate_series(options: &SimulateOptions) -> Result<()> {
    if !(0.0..=1.0).contains(&options.mask_fraction) {
        return Err(anyhow::anyhow!(
            "Invalid mask fraction: {}. Use a value between 0.0 and 1.0",
            options.mask_fraction
        ));
    }
    if options.interval_ms <= 0 {
        return Err(anyhow::anyhow!(
            "Invalid interval: {} ms. Samples must be strictly increasing in time",
            options.interval_ms
        ));
    }

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let params = GaussianSeriesParams {
        samples: options.samples,
        channels: options.channels,
        pixels: options.pixels,
        mean: options.mean,
        std_dev: options.std,
        start: Utc::now(),
        interval: Duration::milliseconds(options.interval_ms),
    };
    let mut series = params.generate(&options.column, &mut rng)?;

    if options.mask_fraction > 0.0 {
        let masks = (0..options.samples)
            .map(|_| {
                DMatrix::from_fn(options.channels, options.pixels, |_, _| {
                    !rng.gen_bool(options.mask_fraction)
                })
            })
            .collect();
        series = series.with_mask(&options.column, masks)?;
    }

    tracing::info!(
        "Simulated {} samples of {}x{} readings (mean {}, std {})",
        options.samples,
        options.channels,
        options.pixels,
        options.mean,
        options.std
    );

    let json = serde_json::to_string(&SeriesFile::from(&series))?;
    match &options.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write series file: {}", path))?,
        None => println!("{}", json),
    }

    Ok(())
}
