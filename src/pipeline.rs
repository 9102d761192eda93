use indicatif::ProgressBar;
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::error::PipelineError;
use crate::importers::SheetExtractor;
use crate::services::Classifier;
use crate::tidy_csv;

/// Outcome of a full workbook run
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub locations: Vec<String>,
    pub tidy_paths: Vec<PathBuf>,
    pub records: usize,
    pub flagged: usize,
    pub merged_path: PathBuf,
}

/// Extract every location sheet, write the per-location tidy files, merge
/// them and write the classified merged table
///
/// Every sheet is extracted before the first file is written, so a sheet that
/// fails leaves the data directory untouched.
pub fn run(config: &Config, progress: &ProgressBar) -> Result<PipelineSummary, PipelineError> {
    let extractor = SheetExtractor::new(
        config.workbook_path.to_string_lossy(),
        config.sheet_layout()?,
        config.year,
        config.week_convention,
    );
    let classifier = Classifier::new(config.range_table()?);

    let extracted = extractor.extract_all()?;
    if extracted.is_empty() {
        return Err(PipelineError::SchemaMismatch(format!(
            "No location sheets found in {}",
            config.workbook_path.display()
        )));
    }

    progress.set_length(extracted.len() as u64);
    let mut locations = Vec::with_capacity(extracted.len());
    let mut tidy_paths = Vec::with_capacity(extracted.len());
    for (location, records) in &extracted {
        progress.set_message(location.clone());
        let path = config.tidy_path(location);
        tidy_csv::write_tidy(&path, records)?;
        locations.push(location.clone());
        tidy_paths.push(path);
        progress.inc(1);
    }

    let merged = tidy_csv::merge_files(&tidy_paths)?;
    info!(
        "Merged {} records from {} locations",
        merged.len(),
        tidy_paths.len()
    );

    let classified = classifier.classify_all(merged);
    let merged_path = config.merged_path();
    tidy_csv::write_classified(&merged_path, &classified)?;

    Ok(PipelineSummary {
        locations,
        tidy_paths,
        records: classified.len(),
        flagged: classified.iter().filter(|r| !r.is_normal()).count(),
        merged_path,
    })
}
