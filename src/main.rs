use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hydronomics_pipeline::config::ConfigOverrides;
use hydronomics_pipeline::pipeline;

#[derive(Parser, Debug)]
#[command(name = "hydronomics-pipeline")]
#[command(
    about = "Extract every location sheet, merge the tidy tables and classify the result",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    config: ConfigOverrides,
}

#[instrument]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hydronomics_pipeline=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.config.resolve()?;
    info!("Starting hydronomics pipeline with config: {:?}", config);

    let start_time = Instant::now();

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let summary = pipeline::run(&config, &pb)?;
    pb.finish_with_message(format!("✓ Wrote {} tidy files", summary.tidy_paths.len()));

    println!("\n=== Pipeline Summary ===");
    println!("Workbook:        {}", config.workbook_path.display());
    println!("Locations:       {}", summary.locations.join(", "));
    println!("Records:         {}", summary.records);
    println!("Flagged records: {}", summary.flagged);
    println!("Output:          {}", summary.merged_path.display());
    println!("Duration:        {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}
