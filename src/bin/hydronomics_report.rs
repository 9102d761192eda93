use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use hydronomics_pipeline::config::ConfigOverrides;
use hydronomics_pipeline::services::reports::{FlaggedReading, RangeViolationGroup};
use hydronomics_pipeline::services::{
    low_ec_readings, range_violations, Classifier, Completeness, NormalRanking, StatusSummary,
};
use hydronomics_pipeline::tidy_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Report {
    /// Anomaly counts by status, metric and location
    Anomalies,
    /// Share of normal readings per metric
    Ranking,
    /// Missing values by location, metric and weekday
    Completeness,
    /// EC readings below the threshold
    LowEc,
    /// Out-of-range readings grouped by greenhouse and metric
    Violations,
    /// Every report above
    All,
}

#[derive(Parser)]
#[command(name = "hydronomics-report")]
#[command(about = "Print analysis reports for the merged hydronomics table", long_about = None)]
struct Cli {
    /// Which report to print
    #[arg(long, value_enum, default_value = "all")]
    report: Report,

    /// Input CSV (default: '<data-dir>/Hydronomics Data Merged.csv')
    #[arg(long)]
    input: Option<PathBuf>,

    /// Threshold for the low EC query
    #[arg(long, default_value = "1000")]
    ec_threshold: f64,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    config: ConfigOverrides,
}

#[derive(Serialize, Default)]
struct ReportBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    anomalies: Option<StatusSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranking: Option<NormalRanking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completeness: Option<Completeness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    low_ec: Option<Vec<FlaggedReading>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<Vec<RangeViolationGroup>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.resolve()?;

    let input = cli.input.unwrap_or_else(|| config.merged_path());
    let records = tidy_csv::read_tidy(&input)?;
    info!("Successfully loaded {}", input.display());

    // Reclassify so the reports always agree with the configured ranges
    let classified = Classifier::new(config.range_table()?).classify_all(records);

    let wants = |r: Report| cli.report == Report::All || cli.report == r;
    let bundle = ReportBundle {
        anomalies: wants(Report::Anomalies).then(|| StatusSummary::from_records(&classified)),
        ranking: wants(Report::Ranking).then(|| NormalRanking::from_records(&classified)),
        completeness: wants(Report::Completeness)
            .then(|| Completeness::from_records(&classified)),
        low_ec: wants(Report::LowEc).then(|| low_ec_readings(&classified, cli.ec_threshold)),
        violations: wants(Report::Violations).then(|| range_violations(&classified)),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
        return Ok(());
    }

    if let Some(summary) = &bundle.anomalies {
        println!("{summary}");
    }
    if let Some(ranking) = &bundle.ranking {
        println!("{ranking}");
    }
    if let Some(completeness) = &bundle.completeness {
        println!("{completeness}");
    }
    if let Some(low) = &bundle.low_ec {
        println!("--- Querying EC Values Less Than {} ---", cli.ec_threshold);
        if low.is_empty() {
            println!("No EC values less than {} found.", cli.ec_threshold);
        } else {
            println!("Found {} EC values less than {}.\n", low.len(), cli.ec_threshold);
            for r in low {
                println!(
                    "  {:<10} {} {:<8} {}",
                    r.metric_code, r.date_time, r.location, r.value
                );
            }
        }
        println!();
    }
    if let Some(groups) = &bundle.violations {
        println!("--- Anomalous Data Report ---");
        if groups.is_empty() {
            println!("No significant anomalies found based on defined ranges.");
        }
        for group in groups {
            println!("\nGreenhouse: {}", group.location);
            println!("  Metric: {} ({})", group.metric_name, group.metric_code);
            println!("    Anomalous Entries:");
            for entry in &group.entries {
                println!("      Date/Time: {}, Value: {}", entry.date_time, entry.value);
            }
        }
        println!("\n--- End of Report ---");
    }

    Ok(())
}
