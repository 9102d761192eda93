use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metrics::MetricCode;

/// One observation in the tidy table
///
/// `value` is the cell text copied verbatim from the sheet; `None` means the cell
/// was blank. Records are kept for blank cells so every (metric, week, weekday)
/// covered by the header has exactly one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidyRecord {
    pub metric_code: MetricCode,
    #[serde(with = "date_format")]
    pub date_time: NaiveDate,
    pub week_num: String,
    pub value: Option<String>,
    pub location: String,
}

impl TidyRecord {
    /// Numeric coercion of `value`; blanks, text and NaN all fail
    pub fn numeric_value(&self) -> Option<f64> {
        coerce_numeric(self.value.as_deref())
    }
}

pub fn coerce_numeric(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| !v.is_nan())
}

/// Qualitative status of a reading; a normal reading has no status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    NonNumeric,
    OutOfRange,
    LowEcToVerify,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NonNumeric => "non-numeric",
            Status::OutOfRange => "out-of-range",
            Status::LowEcToVerify => "low-ec-to-verify",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A tidy record annotated by the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub metric_code: MetricCode,
    #[serde(with = "date_format")]
    pub date_time: NaiveDate,
    pub week_num: String,
    pub value: Option<String>,
    pub location: String,
    pub status: Option<Status>,
}

impl ClassifiedRecord {
    pub fn new(record: TidyRecord, status: Option<Status>) -> Self {
        Self {
            metric_code: record.metric_code,
            date_time: record.date_time,
            week_num: record.week_num,
            value: record.value,
            location: record.location,
            status,
        }
    }

    pub fn is_normal(&self) -> bool {
        self.status.is_none()
    }

    pub fn numeric_value(&self) -> Option<f64> {
        coerce_numeric(self.value.as_deref())
    }

    /// Drop the status, e.g. before re-classifying with a different range table
    pub fn into_tidy(self) -> TidyRecord {
        TidyRecord {
            metric_code: self.metric_code,
            date_time: self.date_time,
            week_num: self.week_num,
            value: self.value,
            location: self.location,
        }
    }
}

/// `YYYY-MM-DD` on write; also accepts a midnight timestamp on read
pub(crate) mod date_format {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const DATE: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(DATE).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let trimmed = s.trim();
        NaiveDate::parse_from_str(trimmed, DATE)
            .or_else(|_| {
                NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
            })
            .or_else(|_| {
                NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date())
            })
            .map_err(|_| de::Error::custom(format!("invalid date_time '{s}'")))
    }
}
