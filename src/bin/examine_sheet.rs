/// Dump the raw cell grid of a monitoring sheet to check the row layout
use clap::Parser;
use hydronomics_pipeline::config::ConfigOverrides;
use hydronomics_pipeline::importers::{week_columns, SheetExtractor};
use hydronomics_pipeline::metrics::MetricCode;

#[derive(Parser)]
#[command(name = "examine-sheet")]
#[command(about = "Print the raw grid, week header and metric blocks of one sheet", long_about = None)]
struct Cli {
    /// Sheet to examine; lists all sheets when omitted
    sheet: Option<String>,

    /// Number of rows to print
    #[arg(long, default_value = "90")]
    rows: usize,

    /// Number of columns to print
    #[arg(long, default_value = "8")]
    cols: usize,

    #[command(flatten)]
    config: ConfigOverrides,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = cli.config.resolve()?;
    let layout = config.sheet_layout()?;

    let extractor = SheetExtractor::new(
        config.workbook_path.to_string_lossy(),
        layout.clone(),
        config.year,
        config.week_convention,
    );
    println!("Opening workbook: {}", extractor.workbook_path());

    let Some(sheet_name) = cli.sheet else {
        println!("\nLocation sheets:");
        for (i, name) in extractor.location_sheet_names()?.iter().enumerate() {
            println!("  {i}: {name}");
        }
        return Ok(());
    };

    let range = extractor.read_sheet(&sheet_name)?;
    println!("\nExamining sheet: {sheet_name}");
    println!("{}", "=".repeat(100));
    println!("Dimensions: {:?} (starts at {:?})", range.get_size(), range.start());

    match week_columns(&range, &layout) {
        Ok(weeks) => {
            println!("\nWeek header (row {}):", layout.week_header_row);
            for w in &weeks {
                println!("  col {:3} -> week {}", w.col, w.week);
            }
        }
        Err(e) => println!("\nWeek header problem: {e}"),
    }

    println!("\nMetric blocks:");
    for metric in MetricCode::ALL {
        if let Some(start) = layout.start_row(metric) {
            println!("  {:<14} rows {}..={}", metric, start, start + 6);
        }
    }

    println!("\nFirst {} rows (showing first {} columns):", cli.rows, cli.cols);
    println!("{}", "=".repeat(100));
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    for (idx, row) in range.rows().enumerate().take(cli.rows) {
        // Only print rows with data
        let has_data = row.iter().any(|cell| !matches!(cell, calamine::Data::Empty));
        if has_data {
            print!("Row {:3}: ", idx + row_offset);
            for (c, cell) in row.iter().enumerate().take(cli.cols) {
                if matches!(cell, calamine::Data::Empty) {
                    print!("[{}:empty] ", c + col_offset);
                } else {
                    print!("[{}:{cell}] ", c + col_offset);
                }
            }
            println!();
        }
    }

    Ok(())
}
