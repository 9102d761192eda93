/// Shared utility functions for the hydronomics pipeline
use regex::Regex;

use crate::error::PipelineError;

/// Extract the location identifier from a sheet name
///
/// Sheets are named like "Hydronomics GH2" or "Hydronomics NURSERY". The first
/// greenhouse (GH1..GH4) or nursery token wins and is returned uppercased.
///
/// # Examples
///
/// ```
/// use hydronomics_pipeline::utils::extract_location;
///
/// assert_eq!(extract_location("Hydronomics GH2").unwrap(), "GH2");
/// assert_eq!(extract_location("hydronomics nursery").unwrap(), "NURSERY");
/// assert!(extract_location("Summary").is_err());
/// ```
pub fn extract_location(sheet_name: &str) -> Result<String, PipelineError> {
    Regex::new(r"(?i)(GH[1-4]|NURSERY)")
        .ok()
        .and_then(|re| re.find(sheet_name))
        .map(|m| m.as_str().to_ascii_uppercase())
        .ok_or_else(|| {
            PipelineError::source_unavailable(
                sheet_name,
                "no location (GH1-GH4 or NURSERY) in sheet name",
            )
        })
}

/// Sheet name for a location as used in the monitoring workbook
///
/// `Nursery` maps to the uppercase `Hydronomics NURSERY` sheet; greenhouses keep
/// their identifier as given.
pub fn sheet_name_for_location(location: &str) -> String {
    if location.eq_ignore_ascii_case("nursery") {
        "Hydronomics NURSERY".to_string()
    } else {
        format!("Hydronomics {}", location.to_ascii_uppercase())
    }
}

/// Per-location tidy file name, e.g. `Hydronomics Data gh2.csv`
pub fn tidy_file_name(location: &str) -> String {
    format!("Hydronomics Data {}.csv", location.to_ascii_lowercase())
}
