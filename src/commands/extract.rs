use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::ExtractionOptions;
use crate::engine::ExtractionConfig;
use crate::series::{SampleSeries, SeriesFile};
use crate::statistics::ChunkStatistics;
use crate::utils::{finite_mean, format_timestamp, matrix_rows, truncate_string};

pub fn extract_statistics(
    series_path: &str,
    options: &ExtractionOptions,
    format: &str,
) -> Result<()> {
    let base = options
        .config
        .as_deref()
        .map(|path| load_config(Path::new(path)))
        .transpose()?;
    let config = options.to_extraction_config(base)?;

    let series = load_series(Path::new(series_path))?;
    tracing::info!(
        "Loaded {} samples with columns [{}] from {}",
        series.len(),
        series.column_names().collect::<Vec<_>>().join(", "),
        series_path
    );

    let stats = config
        .extract(&series)
        .with_context(|| format!("Failed to extract statistics from {}", series_path))?;

    match format {
        "json" => output_json(&stats, &config)?,
        _ => output_table(&stats, &config)?,
    }

    Ok(())
}

pub fn load_config(path: &Path) -> Result<ExtractionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn load_series(path: &Path) -> Result<SampleSeries> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read series file: {}", path.display()))?;
    let file: SeriesFile = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse series file: {}", path.display()))?;
    file.into_series()
        .with_context(|| format!("Invalid series in {}", path.display()))
}

fn output_table(stats: &ChunkStatistics, config: &ExtractionConfig) -> Result<()> {
    println!(
        "{:<24} {:<24} {:<10} {:>12} {:>12} {:>12} {:>8}",
        "Start", "Stop", "Column", "Mean", "Median", "Std", "Invalid"
    );
    println!("{:-<110}", "");

    for (start, record) in stats {
        println!(
            "{:<24} {:<24} {:<10} {:>12.4} {:>12.4} {:>12.4} {:>8}",
            format_timestamp(start),
            format_timestamp(&record.extraction_stop),
            truncate_string(&config.column, 10),
            finite_mean(&record.mean),
            finite_mean(&record.median),
            finite_mean(&record.std),
            record.invalid_cells().len()
        );
    }

    println!("\nTotal: {} chunks of {} samples", stats.len(), config.chunk_size);
    Ok(())
}

fn output_json(stats: &ChunkStatistics, config: &ExtractionConfig) -> Result<()> {
    let chunks: Vec<serde_json::Value> = stats
        .iter()
        .map(|(start, record)| {
            serde_json::json!({
                "start": start,
                "extraction_start": record.extraction_start,
                "extraction_stop": record.extraction_stop,
                "mean": matrix_rows(&record.mean),
                "median": matrix_rows(&record.median),
                "std": matrix_rows(&record.std),
                "n_samples": matrix_rows(&record.n_samples),
            })
        })
        .collect();

    let output = serde_json::json!({
        "config": config,
        "chunks": chunks,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
