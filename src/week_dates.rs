/// Week-number to calendar-date conversion
///
/// The monitoring sheets label columns with a bare week number and rows with a
/// weekday. Two conventions are supported and one is applied uniformly per run:
///
/// - `Iso`: ISO-8601 week dates. Week 1 is the week containing January 4th, so its
///   Monday can fall in the previous December.
/// - `MondayFirst`: `%Y-%W-%w` semantics. Week 1 begins on the first Monday of the
///   calendar year. Sunday is the last day of its week, never day 0 of the next.
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

pub const MIN_WEEK: u32 = 1;
pub const MAX_WEEK: u32 = 53;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeekConvention {
    #[default]
    Iso,
    MondayFirst,
}

impl fmt::Display for WeekConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekConvention::Iso => f.write_str("iso"),
            WeekConvention::MondayFirst => f.write_str("monday-first"),
        }
    }
}

impl FromStr for WeekConvention {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iso" => Ok(WeekConvention::Iso),
            "monday-first" | "monday_first" | "%w" => Ok(WeekConvention::MondayFirst),
            other => Err(PipelineError::SchemaMismatch(format!(
                "Unknown week convention '{other}' (expected 'iso' or 'monday-first')"
            ))),
        }
    }
}

impl WeekConvention {
    /// Calendar date of `weekday_offset` (0 = Monday .. 6 = Sunday) in `week` of `year`
    ///
    /// Returns `None` for a week or offset outside the valid range.
    pub fn date_for(&self, year: i32, week: u32, weekday_offset: u32) -> Option<NaiveDate> {
        if !(MIN_WEEK..=MAX_WEEK).contains(&week) {
            return None;
        }
        let weekday = *WEEKDAYS.get(weekday_offset as usize)?;

        match self {
            WeekConvention::Iso => NaiveDate::from_isoywd_opt(year, week, weekday)
                .or_else(|| {
                    // Week 53 in a 52-week ISO year: count forward from week 1
                    let week_one = NaiveDate::from_isoywd_opt(year, 1, Weekday::Mon)?;
                    offset_from(week_one, week, weekday_offset)
                }),
            WeekConvention::MondayFirst => {
                let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
                let to_monday = (7 - jan_first.weekday().num_days_from_monday()) % 7;
                let first_monday = jan_first.checked_add_days(Days::new(to_monday as u64))?;
                offset_from(first_monday, week, weekday_offset)
            }
        }
    }
}

fn offset_from(week_one_monday: NaiveDate, week: u32, weekday_offset: u32) -> Option<NaiveDate> {
    let days = (week as u64 - 1) * 7 + weekday_offset as u64;
    week_one_monday.checked_add_days(Days::new(days))
}

/// Weekday offset of a date, 0 = Monday .. 6 = Sunday
pub fn weekday_offset(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

/// Week label written to the tidy table, e.g. `2025-07`
pub fn week_label(year: i32, week: u32) -> String {
    format!("{year}-{week:02}")
}

/// Parse a `YYYY-WW` label back into its parts
pub fn parse_week_label(label: &str) -> Option<(i32, u32)> {
    let (year, week) = label.trim().split_once('-')?;
    let year = year.parse::<i32>().ok()?;
    let week = week.parse::<u32>().ok()?;
    (MIN_WEEK..=MAX_WEEK).contains(&week).then_some((year, week))
}
