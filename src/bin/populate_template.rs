use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use hydronomics_pipeline::config::ConfigOverrides;
use hydronomics_pipeline::importers::{
    build_template, populate_template, retarget_template, SheetExtractor,
};
use hydronomics_pipeline::tidy_csv;
use hydronomics_pipeline::utils::{extract_location, sheet_name_for_location};

#[derive(Parser)]
#[command(name = "populate-template")]
#[command(about = "Create a greenhouse template or fill one from the monitoring workbook", long_about = None)]
struct Cli {
    /// The ID of the greenhouse (e.g., GH1, GH2, GH3, GH4, Nursery)
    greenhouse_id: String,

    /// Create the template instead of populating it
    #[arg(long)]
    create: bool,

    /// With --create: copy metric/date/week rows from this existing template
    #[arg(long, requires = "create")]
    from_template: Option<PathBuf>,

    /// With --create and no --from-template: first week to include
    #[arg(long, default_value = "1")]
    first_week: u32,

    /// With --create and no --from-template: last week to include
    #[arg(long, default_value = "52")]
    last_week: u32,

    /// Template CSV path (default: '<data-dir>/<ID> Template - data <id>.csv')
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output CSV path when populating (default: '<data-dir>/Hydronomics Data <id>.csv')
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
    let location = extract_location(&cli.greenhouse_id)?;
    let template_path = cli
        .template
        .unwrap_or_else(|| config.template_path(&location));

    if cli.create {
        let rows = match &cli.from_template {
            Some(source) => retarget_template(&tidy_csv::read_tidy(source)?, &location),
            None => build_template(
                &location,
                config.year,
                cli.first_week..=cli.last_week,
                config.week_convention,
            )?,
        };
        tidy_csv::write_tidy(&template_path, &rows)?;
        info!(
            "Successfully created {} template at {}",
            location,
            template_path.display()
        );
        return Ok(());
    }

    let sheet_name = sheet_name_for_location(&location);
    info!("Populating template for {}...", sheet_name);

    let template = tidy_csv::read_tidy(&template_path)?;
    let layout = config.sheet_layout()?;
    let extractor = SheetExtractor::new(
        config.workbook_path.to_string_lossy(),
        layout.clone(),
        config.year,
        config.week_convention,
    );
    let range = extractor.read_sheet(&sheet_name)?;
    let populated = populate_template(template, &range, &layout)?;

    let output = cli
        .output
        .unwrap_or_else(|| config.tidy_path(&location));
    tidy_csv::write_tidy(&output, &populated)?;
    info!("Successfully populated {}", output.display());
    Ok(())
}
