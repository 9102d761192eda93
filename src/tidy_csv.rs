/// CSV persistence for tidy and classified tables
///
/// Every write goes through a temp file in the destination directory that is
/// only moved into place once fully written, so a failed run leaves any
/// previous output untouched and never a partial file.
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::metrics::MetricCode;
use crate::models::{ClassifiedRecord, TidyRecord};

pub const TIDY_COLUMNS: [&str; 5] = ["metric_code", "date_time", "week_num", "value", "location"];
pub const CLASSIFIED_COLUMNS: [&str; 6] = [
    "metric_code",
    "date_time",
    "week_num",
    "value",
    "location",
    "status",
];

pub fn read_tidy(path: impl AsRef<Path>) -> Result<Vec<TidyRecord>, PipelineError> {
    read_records(path.as_ref(), &TIDY_COLUMNS)
}

pub fn read_classified(path: impl AsRef<Path>) -> Result<Vec<ClassifiedRecord>, PipelineError> {
    read_records(path.as_ref(), &CLASSIFIED_COLUMNS)
}

pub fn write_tidy(path: impl AsRef<Path>, records: &[TidyRecord]) -> Result<(), PipelineError> {
    write_records(path.as_ref(), &TIDY_COLUMNS, records)
}

pub fn write_classified(
    path: impl AsRef<Path>,
    records: &[ClassifiedRecord],
) -> Result<(), PipelineError> {
    write_records(path.as_ref(), &CLASSIFIED_COLUMNS, records)
}

fn read_records<T: DeserializeOwned>(
    path: &Path,
    required: &[&str],
) -> Result<Vec<T>, PipelineError> {
    let file = File::open(path)
        .map_err(|e| PipelineError::source_unavailable(path.display().to_string(), e))?;
    let mut reader = ReaderBuilder::new().from_reader(file);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::SchemaMismatch(format!(
            "{} is missing columns: {}",
            path.display(),
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: T = result.map_err(|e| {
            PipelineError::SchemaMismatch(format!("{}: {}", path.display(), e))
        })?;
        records.push(record);
    }

    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

fn write_records<T: Serialize>(
    path: &Path,
    columns: &[&str],
    records: &[T],
) -> Result<(), PipelineError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;

    {
        // Header is written explicitly so an empty table still gets one
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(temp.as_file_mut());
        writer.write_record(columns)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }

    temp.persist(path).map_err(|e| PipelineError::Io(e.error))?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Concatenate per-location tidy files in the given order
///
/// Any unreadable input aborts the whole merge.
pub fn merge_files(paths: &[PathBuf]) -> Result<Vec<TidyRecord>, PipelineError> {
    let mut merged = Vec::new();
    for path in paths {
        let mut records = read_tidy(path)?;
        info!("Loaded {} records from {}", records.len(), path.display());
        merged.append(&mut records);
    }

    let duplicates = duplicate_keys(&merged);
    if !duplicates.is_empty() {
        warn!(
            "{} duplicate (metric_code, date_time, location) keys in merged table, first: {:?}",
            duplicates.len(),
            duplicates[0]
        );
    }
    Ok(merged)
}

/// Keys that occur more than once, in order of their second appearance
pub fn duplicate_keys(records: &[TidyRecord]) -> Vec<(MetricCode, NaiveDate, String)> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for record in records {
        let key = (record.metric_code, record.date_time, record.location.clone());
        if !seen.insert(key.clone()) {
            duplicates.push(key);
        }
    }
    duplicates
}
