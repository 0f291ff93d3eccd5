use clap::{Parser, Subcommand};

use crate::engine::ExtractionConfig;
use crate::extractor::{ExtractorKind, SigmaClippingConfig};

#[derive(Parser)]
#[command(name = "chunkstat")]
#[command(about = "Chunked robust statistics for camera calibration series", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute per-chunk mean, median and std of a series column
    Extract {
        /// Series file (JSON)
        series: String,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        #[command(flatten)]
        extraction: ExtractionOptions,
    },

    /// Write a synthetic series with Gaussian readings
    Simulate {
        #[command(flatten)]
        options: SimulateOptions,
    },
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ExtractionOptions {
    /// Extraction configuration file (JSON); the options below override it
    #[arg(long)]
    pub config: Option<String>,

    /// Column to reduce
    #[arg(short, long)]
    pub column: Option<String>,

    /// Number of samples per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Stride between chunk starts (default: chunk size)
    #[arg(long)]
    pub chunk_shift: Option<usize>,

    /// Reduction strategy (plain, sigma-clipping)
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Lower clipping threshold in standard deviations
    #[arg(long)]
    pub sigma_low: Option<f64>,

    /// Upper clipping threshold in standard deviations
    #[arg(long)]
    pub sigma_high: Option<f64>,

    /// Maximum number of clipping passes
    #[arg(long)]
    pub iterations: Option<usize>,
}

impl ExtractionOptions {
    /// Merge the command-line options over `base` (a loaded config file, if any).
    pub fn to_extraction_config(
        &self,
        base: Option<ExtractionConfig>,
    ) -> anyhow::Result<ExtractionConfig> {
        let mut config = match (base, self.chunk_size) {
            (Some(mut config), chunk_size) => {
                if let Some(chunk_size) = chunk_size {
                    config.chunk_size = chunk_size;
                }
                config
            }
            (None, Some(chunk_size)) => ExtractionConfig::new(chunk_size),
            (None, None) => {
                return Err(anyhow::anyhow!(
                    "No chunk size given. Use --chunk-size or a --config file"
                ))
            }
        };

        if let Some(column) = &self.column {
            config.column = column.clone();
        }
        if self.chunk_shift.is_some() {
            config.chunk_shift = self.chunk_shift;
        }

        if let Some(strategy) = &self.strategy {
            config.extractor = match strategy.to_lowercase().as_str() {
                "plain" => ExtractorKind::Plain,
                "sigma-clipping" | "sigma_clipping" => match &config.extractor {
                    ExtractorKind::SigmaClipping(existing) => {
                        ExtractorKind::SigmaClipping(existing.clone())
                    }
                    ExtractorKind::Plain => {
                        ExtractorKind::SigmaClipping(SigmaClippingConfig::default())
                    }
                },
                _ => {
                    return Err(anyhow::anyhow!(
                        "Invalid strategy: {}. Use plain or sigma-clipping",
                        strategy
                    ))
                }
            };
        }

        let clipping_flags =
            self.sigma_low.is_some() || self.sigma_high.is_some() || self.iterations.is_some();
        match &mut config.extractor {
            ExtractorKind::SigmaClipping(clipping) => {
                if let Some(low) = self.sigma_low {
                    clipping.max_sigma_low = low;
                }
                if let Some(high) = self.sigma_high {
                    clipping.max_sigma_high = high;
                }
                if let Some(iterations) = self.iterations {
                    clipping.max_iterations = iterations;
                }
            }
            ExtractorKind::Plain if clipping_flags => {
                tracing::warn!("Sigma clipping options are ignored by the plain strategy");
            }
            ExtractorKind::Plain => {}
        }

        Ok(config)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct SimulateOptions {
    /// Number of samples
    #[arg(long, default_value = "5000")]
    pub samples: usize,

    /// Number of gain channels
    #[arg(long, default_value = "2")]
    pub channels: usize,

    /// Number of camera pixels
    #[arg(long, default_value = "1855")]
    pub pixels: usize,

    /// Mean of the readings
    #[arg(long, default_value = "0.0")]
    pub mean: f64,

    /// Standard deviation of the readings
    #[arg(long, default_value = "1.0")]
    pub std: f64,

    /// Column name to write
    #[arg(short, long, default_value = "image")]
    pub column: String,

    /// Fraction of readings to flag as unusable in the mask (0.0-1.0)
    #[arg(long, default_value = "0.0")]
    pub mask_fraction: f64,

    /// Milliseconds between samples
    #[arg(long, default_value = "1")]
    pub interval_ms: i64,

    /// Random seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}
