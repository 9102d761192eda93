use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::metrics::{MetricCode, SheetLayout};
use crate::models::TidyRecord;
use crate::utils::extract_location;
use crate::week_dates::{week_label, WeekConvention, MAX_WEEK, MIN_WEEK};

/// A week column found in the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekColumn {
    pub col: usize,
    pub week: u32,
}

/// Extractor for Hydronomics monitoring workbooks (one sheet per location)
pub struct SheetExtractor {
    workbook_path: String,
    layout: SheetLayout,
    year: i32,
    convention: WeekConvention,
}

impl SheetExtractor {
    pub fn new(
        workbook_path: impl Into<String>,
        layout: SheetLayout,
        year: i32,
        convention: WeekConvention,
    ) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            layout,
            year,
            convention,
        }
    }

    pub fn workbook_path(&self) -> &str {
        &self.workbook_path
    }

    fn open(&self) -> Result<Sheets<BufReader<File>>, PipelineError> {
        open_workbook_auto(&self.workbook_path)
            .map_err(|e| PipelineError::source_unavailable(&self.workbook_path, e))
    }

    /// Names of the sheets that carry a location identifier
    ///
    /// Fails with `SchemaMismatch` when two sheets resolve to the same location.
    pub fn location_sheet_names(&self) -> Result<Vec<String>, PipelineError> {
        let workbook = self.open()?;
        let names: Vec<String> = location_sheets(&workbook.sheet_names())?
            .into_iter()
            .map(|(sheet_name, _)| sheet_name)
            .collect();
        debug!(
            "Found {} location sheets in {}",
            names.len(),
            self.workbook_path
        );
        Ok(names)
    }

    /// Read the raw cell grid of one sheet
    pub fn read_sheet(&self, sheet_name: &str) -> Result<Range<Data>, PipelineError> {
        let mut workbook = self.open()?;
        read_range(&mut workbook, sheet_name)
    }

    /// Convert one location sheet into tidy records
    ///
    /// The location is resolved from the sheet name before the workbook is opened,
    /// so an unrecognised sheet fails without touching the file.
    pub fn extract_sheet(&self, sheet_name: &str) -> Result<Vec<TidyRecord>, PipelineError> {
        let location = extract_location(sheet_name)?;
        info!("Processing sheet: {} (location {})", sheet_name, location);

        let range = self.read_sheet(sheet_name)?;
        self.extract_range(&range, &location)
    }

    /// Extract every location sheet in the workbook
    ///
    /// Returns `(location, records)` pairs in workbook order. All sheets are
    /// read from one open workbook and the first failing sheet fails the whole
    /// call, so callers never see a partial result.
    pub fn extract_all(&self) -> Result<Vec<(String, Vec<TidyRecord>)>, PipelineError> {
        let mut workbook = self.open()?;
        let sheets = location_sheets(&workbook.sheet_names())?;

        let mut results = Vec::with_capacity(sheets.len());
        for (sheet_name, location) in sheets {
            let range = read_range(&mut workbook, &sheet_name)?;
            let records = self.extract_range(&range, &location)?;
            info!(
                "Successfully transformed {}: {} records",
                sheet_name,
                records.len()
            );
            results.push((location, records));
        }

        if results.is_empty() {
            warn!("No location sheets found in {}", self.workbook_path);
        }
        Ok(results)
    }

    /// Convert an in-memory sheet grid into tidy records for `location`
    ///
    /// Produces one record per (metric, weekday, week column) whether or not the
    /// cell holds a value, sorted by metric code then date.
    pub fn extract_range(
        &self,
        range: &Range<Data>,
        location: &str,
    ) -> Result<Vec<TidyRecord>, PipelineError> {
        let weeks = week_columns(range, &self.layout)?;
        debug!(
            "Found {} week columns for {} (weeks {:?})",
            weeks.len(),
            location,
            weeks.iter().map(|w| w.week).collect::<Vec<_>>()
        );

        let mut records = Vec::with_capacity(
            weeks.len() * SheetLayout::DAYS_PER_BLOCK * self.layout.metric_start_rows.len(),
        );

        for metric in MetricCode::ALL {
            let Some(start_row) = self.layout.start_row(metric) else {
                continue;
            };

            for day_offset in 0..SheetLayout::DAYS_PER_BLOCK {
                let row = start_row + day_offset;

                for column in &weeks {
                    let date_time = self
                        .convention
                        .date_for(self.year, column.week, day_offset as u32)
                        .ok_or_else(|| {
                            PipelineError::SchemaMismatch(format!(
                                "No calendar date for {} week {} day {}",
                                self.year, column.week, day_offset
                            ))
                        })?;

                    records.push(TidyRecord {
                        metric_code: metric,
                        date_time,
                        week_num: week_label(self.year, column.week),
                        value: cell_text(cell_at(range, row, column.col)),
                        location: location.to_string(),
                    });
                }
            }
        }

        records.sort_by(|a, b| {
            a.metric_code
                .as_str()
                .cmp(b.metric_code.as_str())
                .then(a.date_time.cmp(&b.date_time))
        });

        let blanks = records.iter().filter(|r| r.value.is_none()).count();
        info!(
            "Extracted {} records for {} ({} blank cells)",
            records.len(),
            location,
            blanks
        );
        Ok(records)
    }
}

/// Pair each location sheet with its location, in workbook order
///
/// Sheets without a location are skipped. Two sheets for one location would
/// write the same tidy file, so that is a layout error.
fn location_sheets(sheet_names: &[String]) -> Result<Vec<(String, String)>, PipelineError> {
    let mut sheets: Vec<(String, String)> = Vec::new();
    for sheet_name in sheet_names {
        let Ok(location) = extract_location(sheet_name) else {
            debug!("Skipping sheet without location: {}", sheet_name);
            continue;
        };
        if let Some((first, _)) = sheets.iter().find(|(_, seen)| *seen == location) {
            return Err(PipelineError::SchemaMismatch(format!(
                "Sheets '{first}' and '{sheet_name}' both resolve to location {location}"
            )));
        }
        sheets.push((sheet_name.clone(), location));
    }
    Ok(sheets)
}

fn read_range(
    workbook: &mut Sheets<BufReader<File>>,
    sheet_name: &str,
) -> Result<Range<Data>, PipelineError> {
    workbook
        .worksheet_range(sheet_name)
        .map_err(|e| PipelineError::source_unavailable(sheet_name, e))
}

/// Cell at an absolute sheet position; `None` outside the used area
pub(crate) fn cell_at(range: &Range<Data>, row: usize, col: usize) -> Option<&Data> {
    let row = u32::try_from(row).ok()?;
    let col = u32::try_from(col).ok()?;
    range.get_value((row, col))
}

/// Scan the header row for week numbers
///
/// Blank cells and anything that is not a whole number in 1..=53 are skipped.
/// A header with no usable week at all means the sheet does not follow the
/// expected layout.
pub fn week_columns(
    range: &Range<Data>,
    layout: &SheetLayout,
) -> Result<Vec<WeekColumn>, PipelineError> {
    let last_col = range.end().map(|(_, col)| col as usize).unwrap_or(0);

    let mut weeks = Vec::new();
    if !range.is_empty() {
        for col in layout.week_header_start_col..=last_col {
            let cell = cell_at(range, layout.week_header_row, col);
            match cell.and_then(week_number) {
                Some(week) => weeks.push(WeekColumn { col, week }),
                None => {
                    if let Some(other) = cell.filter(|c| !matches!(c, Data::Empty)) {
                        debug!(
                            "Ignoring header cell at row {}, col {}: {:?}",
                            layout.week_header_row, col, other
                        );
                    }
                }
            }
        }
    }

    if weeks.is_empty() {
        return Err(PipelineError::SchemaMismatch(format!(
            "No week numbers in header row {} from column {}",
            layout.week_header_row, layout.week_header_start_col
        )));
    }
    Ok(weeks)
}

fn week_number(cell: &Data) -> Option<u32> {
    let value = match cell {
        Data::Int(i) => *i as f64,
        Data::Float(f) => *f,
        _ => return None,
    };
    if value.fract() != 0.0 {
        return None;
    }
    let week = value as i64;
    (MIN_WEEK as i64..=MAX_WEEK as i64)
        .contains(&week)
        .then_some(week as u32)
}

/// Text of a data cell as written to the tidy table
///
/// Numbers use their shortest round-trip form. Blank strings and Excel error
/// cells (#N/A, #DIV/0!) become null; other text is kept verbatim so the
/// classifier can flag it.
pub(crate) fn cell_text(cell: Option<&Data>) -> Option<String> {
    match cell? {
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::String(s) => (!s.trim().is_empty()).then(|| s.clone()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(
            dt.as_datetime()
                .map(|d| d.to_string())
                .unwrap_or_else(|| dt.as_f64().to_string()),
        ),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Error(_) | Data::Empty => None,
    }
}
