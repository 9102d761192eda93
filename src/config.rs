use std::env;
use std::path::PathBuf;

use crate::error::PipelineError;
use crate::metrics::{RangeTable, SheetLayout};
use crate::utils::tidy_file_name;
use crate::week_dates::WeekConvention;

pub const MERGED_FILE_NAME: &str = "Hydronomics Data Merged.csv";
const DEFAULT_WORKBOOK: &str = "Hydronomics Monitoring GH1-4 and Nursery 2025.xlsx";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub workbook_path: PathBuf,
    pub year: i32,
    pub week_convention: WeekConvention,
    pub ranges_file: Option<PathBuf>,
    pub layout_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, PipelineError> {
        let data_dir = PathBuf::from(
            env::var("HYDRONOMICS_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
        );
        let workbook_path = env::var("HYDRONOMICS_WORKBOOK")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join(DEFAULT_WORKBOOK));

        Ok(Config {
            workbook_path,
            year: env::var("HYDRONOMICS_YEAR")
                .unwrap_or_else(|_| "2025".to_string())
                .parse()
                .unwrap_or(2025),
            week_convention: match env::var("HYDRONOMICS_WEEK_CONVENTION") {
                Ok(value) => value.parse()?,
                Err(_) => WeekConvention::default(),
            },
            ranges_file: env::var("HYDRONOMICS_RANGES_FILE").ok().map(PathBuf::from),
            layout_file: env::var("HYDRONOMICS_LAYOUT_FILE").ok().map(PathBuf::from),
            data_dir,
        })
    }

    /// Range table from `ranges_file`, or the built-in defaults
    pub fn range_table(&self) -> Result<RangeTable, PipelineError> {
        match &self.ranges_file {
            Some(path) => RangeTable::from_json_file(path),
            None => Ok(RangeTable::default()),
        }
    }

    /// Sheet layout from `layout_file`, or the built-in defaults
    pub fn sheet_layout(&self) -> Result<SheetLayout, PipelineError> {
        match &self.layout_file {
            Some(path) => SheetLayout::from_json_file(path),
            None => Ok(SheetLayout::default()),
        }
    }

    pub fn tidy_path(&self, location: &str) -> PathBuf {
        self.data_dir.join(tidy_file_name(location))
    }

    pub fn merged_path(&self) -> PathBuf {
        self.data_dir.join(MERGED_FILE_NAME)
    }

    /// Template file for a location, e.g. `GH3 Template - data gh3.csv`
    pub fn template_path(&self, location: &str) -> PathBuf {
        self.data_dir.join(format!(
            "{} Template - data {}.csv",
            location,
            location.to_ascii_lowercase()
        ))
    }
}

/// Command-line overrides shared by the pipeline binaries
///
/// Anything left unset falls back to the environment (see [`Config::from_env`]).
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Directory holding tidy, merged and template CSV files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Path to the monitoring workbook (.xlsx)
    #[arg(long)]
    pub workbook: Option<PathBuf>,

    /// Year the sheet's week numbers refer to
    #[arg(long)]
    pub year: Option<i32>,

    /// Week numbering convention: 'iso' or 'monday-first'
    #[arg(long)]
    pub week_convention: Option<WeekConvention>,

    /// JSON file with per-metric ranges
    #[arg(long)]
    pub ranges: Option<PathBuf>,

    /// JSON file with the sheet layout (header row/column, metric start rows)
    #[arg(long)]
    pub layout: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn resolve(self) -> Result<Config, PipelineError> {
        let mut config = Config::from_env()?;
        if let Some(data_dir) = self.data_dir {
            if self.workbook.is_none() && env::var("HYDRONOMICS_WORKBOOK").is_err() {
                config.workbook_path = data_dir.join(DEFAULT_WORKBOOK);
            }
            config.data_dir = data_dir;
        }
        if let Some(workbook) = self.workbook {
            config.workbook_path = workbook;
        }
        if let Some(year) = self.year {
            config.year = year;
        }
        if let Some(convention) = self.week_convention {
            config.week_convention = convention;
        }
        if self.ranges.is_some() {
            config.ranges_file = self.ranges;
        }
        if self.layout.is_some() {
            config.layout_file = self.layout;
        }
        Ok(config)
    }
}
