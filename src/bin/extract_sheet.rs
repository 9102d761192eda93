use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use hydronomics_pipeline::config::ConfigOverrides;
use hydronomics_pipeline::importers::SheetExtractor;
use hydronomics_pipeline::tidy_csv;
use hydronomics_pipeline::utils::{extract_location, sheet_name_for_location};

#[derive(Parser)]
#[command(name = "extract-sheet")]
#[command(about = "Transform one location sheet of the monitoring workbook into a tidy CSV", long_about = None)]
struct Cli {
    /// Location identifier (GH1..GH4, Nursery); selects the 'Hydronomics <LOCATION>' sheet
    #[arg(required_unless_present = "sheet")]
    location: Option<String>,

    /// Exact sheet name, overriding the name derived from the location
    #[arg(long)]
    sheet: Option<String>,

    /// Output CSV path (default: '<data-dir>/Hydronomics Data <location>.csv')
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

    let sheet_name = match (cli.sheet, cli.location.as_deref()) {
        (Some(sheet), _) => sheet,
        (None, Some(location)) => sheet_name_for_location(location),
        (None, None) => return Err("either a location or --sheet is required".into()),
    };
    let location = extract_location(&sheet_name)?;
    let output = cli.output.unwrap_or_else(|| config.tidy_path(&location));

    let extractor = SheetExtractor::new(
        config.workbook_path.to_string_lossy(),
        config.sheet_layout()?,
        config.year,
        config.week_convention,
    );
    let records = extractor.extract_sheet(&sheet_name)?;
    tidy_csv::write_tidy(&output, &records)?;

    info!(
        "Successfully transformed {} and saved to {}",
        sheet_name,
        output.display()
    );
    Ok(())
}
