use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use hydronomics_pipeline::config::ConfigOverrides;
use hydronomics_pipeline::services::Classifier;
use hydronomics_pipeline::tidy_csv;

#[derive(Parser)]
#[command(name = "classify")]
#[command(about = "Add a status column to a tidy table from the metric range table", long_about = None)]
struct Cli {
    /// Input CSV (default: '<data-dir>/Hydronomics Data Merged.csv')
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output CSV (default: overwrite the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigOverrides,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.resolve()?;

    let input = cli.input.unwrap_or_else(|| config.merged_path());
    let output = cli.output.unwrap_or_else(|| input.clone());

    // Any existing status column is ignored and recomputed
    let records = tidy_csv::read_tidy(&input)?;
    info!("Successfully loaded {} ({} records)", input.display(), records.len());

    let classifier = Classifier::new(config.range_table()?);
    let classified = classifier.classify_all(records);
    tidy_csv::write_classified(&output, &classified)?;

    info!("Successfully updated {} with 'status' column.", output.display());
    Ok(())
}
