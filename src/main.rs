use chunkstat::cli::{Cli, Commands};
use chunkstat::commands::{extract_statistics, simulate_series};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            series,
            format,
            extraction,
        } => {
            extract_statistics(&series, &extraction, &format)?;
        }
        Commands::Simulate { options } => {
            simulate_series(&options)?;
        }
    }

    Ok(())
}
