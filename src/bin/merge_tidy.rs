use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use hydronomics_pipeline::config::ConfigOverrides;
use hydronomics_pipeline::tidy_csv;

#[derive(Parser)]
#[command(name = "merge-tidy")]
#[command(about = "Concatenate per-location tidy CSV files into the merged table", long_about = None)]
struct Cli {
    /// Locations whose '<data-dir>/Hydronomics Data <location>.csv' files are merged, in order
    #[arg(long, value_delimiter = ',', default_value = "GH1,GH2,GH3,GH4,Nursery")]
    locations: Vec<String>,

    /// Explicit input files, used instead of --locations
    #[arg(long = "input", conflicts_with = "locations")]
    inputs: Vec<PathBuf>,

    /// Output CSV path (default: '<data-dir>/Hydronomics Data Merged.csv')
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

    let inputs: Vec<PathBuf> = if cli.inputs.is_empty() {
        cli.locations.iter().map(|l| config.tidy_path(l)).collect()
    } else {
        cli.inputs
    };

    let merged = tidy_csv::merge_files(&inputs)?;
    let output = cli.output.unwrap_or_else(|| config.merged_path());
    tidy_csv::write_tidy(&output, &merged)?;

    info!(
        "Successfully merged {} files ({} records) into {}",
        inputs.len(),
        merged.len(),
        output.display()
    );
    Ok(())
}
