/// Metric codes and the static tables keyed by them
///
/// The monitoring workbook records eight daily metrics per location. Each one has
/// a fixed block of seven rows (Monday..Sunday) in the sheet and a plausible value
/// range used when classifying readings.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCode {
    SysEc,
    SysPh,
    SysH20Temp,
    SysGhTemp,
    SysGhRh,
    FwaterEc,
    FwaterPh,
    FwaterTemp,
}

impl MetricCode {
    /// Canonical order, matching the top-to-bottom block order in the sheet
    pub const ALL: [MetricCode; 8] = [
        MetricCode::SysEc,
        MetricCode::SysPh,
        MetricCode::SysH20Temp,
        MetricCode::SysGhTemp,
        MetricCode::SysGhRh,
        MetricCode::FwaterEc,
        MetricCode::FwaterPh,
        MetricCode::FwaterTemp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCode::SysEc => "sys_ec",
            MetricCode::SysPh => "sys_ph",
            MetricCode::SysH20Temp => "sys_h20_temp",
            MetricCode::SysGhTemp => "sys_gh_temp",
            MetricCode::SysGhRh => "sys_gh_rh",
            MetricCode::FwaterEc => "fwater_ec",
            MetricCode::FwaterPh => "fwater_ph",
            MetricCode::FwaterTemp => "fwater_temp",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MetricCode::SysEc => "System EC",
            MetricCode::SysPh => "System PH",
            MetricCode::SysH20Temp => "Water Temp",
            MetricCode::SysGhTemp => "Greenhouse Temp",
            MetricCode::SysGhRh => "Greenhouse Relative Humidity",
            MetricCode::FwaterEc => "Freshwater EC",
            MetricCode::FwaterPh => "Freshwater PH",
            MetricCode::FwaterTemp => "Freshwater Temp",
        }
    }

    /// Electrical conductivity metrics carry a low-value advisory threshold
    pub fn is_ec(&self) -> bool {
        matches!(self, MetricCode::SysEc | MetricCode::FwaterEc)
    }
}

impl fmt::Display for MetricCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for MetricCode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricCode::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| PipelineError::SchemaMismatch(format!("Unknown metric code: {s}")))
    }
}

/// Inclusive valid range for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_threshold: Option<f64>,
}

impl MetricRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            low_threshold: None,
        }
    }

    pub fn with_low_threshold(mut self, threshold: f64) -> Self {
        self.low_threshold = Some(threshold);
        self
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Immutable lookup from metric to its valid range
///
/// Metrics missing from the table are never classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeTable {
    ranges: BTreeMap<MetricCode, MetricRange>,
}

impl RangeTable {
    pub fn new(ranges: BTreeMap<MetricCode, MetricRange>) -> Self {
        Self { ranges }
    }

    pub fn get(&self, metric: MetricCode) -> Option<&MetricRange> {
        self.ranges.get(&metric)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Load a range table from a JSON object keyed by metric code
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::source_unavailable(path.display().to_string(), e))?;
        let table: RangeTable = serde_json::from_str(&contents)?;
        info!(
            "Loaded {} metric ranges from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        let ec = MetricRange::new(0.0, 10000.0).with_low_threshold(1000.0);
        let ph = MetricRange::new(0.0, 14.0);
        let temp = MetricRange::new(-20.0, 60.0);
        let rh = MetricRange::new(0.0, 100.0);

        let ranges = BTreeMap::from([
            (MetricCode::SysEc, ec),
            (MetricCode::FwaterEc, ec),
            (MetricCode::SysPh, ph),
            (MetricCode::FwaterPh, ph),
            (MetricCode::SysH20Temp, temp),
            (MetricCode::FwaterTemp, temp),
            (MetricCode::SysGhTemp, temp),
            (MetricCode::SysGhRh, rh),
        ]);
        Self { ranges }
    }
}

/// Physical addressing of a monitoring sheet (0-indexed rows and columns)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub week_header_row: usize,
    pub week_header_start_col: usize,
    pub metric_start_rows: BTreeMap<MetricCode, usize>,
}

impl SheetLayout {
    /// Days per metric block, Monday through Sunday
    pub const DAYS_PER_BLOCK: usize = 7;

    pub fn start_row(&self, metric: MetricCode) -> Option<usize> {
        self.metric_start_rows.get(&metric).copied()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::source_unavailable(path.display().to_string(), e))?;
        let layout: SheetLayout = serde_json::from_str(&contents)?;
        info!(
            "Loaded sheet layout with {} metric blocks from {}",
            layout.metric_start_rows.len(),
            path.display()
        );
        Ok(layout)
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            week_header_row: 3,
            week_header_start_col: 2,
            metric_start_rows: BTreeMap::from([
                (MetricCode::SysEc, 20),
                (MetricCode::SysPh, 28),
                (MetricCode::SysH20Temp, 36),
                (MetricCode::SysGhTemp, 44),
                (MetricCode::SysGhRh, 52),
                (MetricCode::FwaterEc, 61),
                (MetricCode::FwaterPh, 69),
                (MetricCode::FwaterTemp, 77),
            ]),
        }
    }
}
