/// Template tables: the full list of (metric, date, week) rows expected for a
/// location, and population of such a list from a monitoring sheet.
use calamine::{Data, Range};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

use super::hydronomics_sheet::{cell_at, cell_text, week_columns};
use crate::error::PipelineError;
use crate::metrics::{MetricCode, SheetLayout};
use crate::models::TidyRecord;
use crate::week_dates::{parse_week_label, week_label, weekday_offset, WeekConvention};

/// Build an empty template covering every metric, week and weekday
///
/// The location is stored uppercase, the form the extractor derives from sheet
/// names, so templates and extracted tables group under one key.
pub fn build_template(
    location: &str,
    year: i32,
    weeks: RangeInclusive<u32>,
    convention: WeekConvention,
) -> Result<Vec<TidyRecord>, PipelineError> {
    let location = location.to_ascii_uppercase();
    let mut rows = Vec::new();

    for metric in MetricCode::ALL {
        for week in weeks.clone() {
            for day_offset in 0..SheetLayout::DAYS_PER_BLOCK as u32 {
                let date_time = convention
                    .date_for(year, week, day_offset)
                    .ok_or_else(|| {
                        PipelineError::SchemaMismatch(format!(
                            "No calendar date for {year} week {week} day {day_offset}"
                        ))
                    })?;
                rows.push(TidyRecord {
                    metric_code: metric,
                    date_time,
                    week_num: week_label(year, week),
                    value: None,
                    location: location.clone(),
                });
            }
        }
    }

    info!("Built template for {} with {} rows", location, rows.len());
    Ok(rows)
}

/// Copy an existing template for another location, clearing all values
pub fn retarget_template(template: &[TidyRecord], location: &str) -> Vec<TidyRecord> {
    let location = location.to_ascii_uppercase();
    template
        .iter()
        .map(|row| TidyRecord {
            value: None,
            location: location.clone(),
            ..row.clone()
        })
        .collect()
}

/// Fill a template's values from a monitoring sheet
///
/// Rows are matched to cells by metric block, the weekday of `date_time` and the
/// week column of `week_num`. A week missing from the sheet header leaves the
/// value null.
pub fn populate_template(
    template: Vec<TidyRecord>,
    range: &Range<Data>,
    layout: &SheetLayout,
) -> Result<Vec<TidyRecord>, PipelineError> {
    let week_to_col: HashMap<u32, usize> = week_columns(range, layout)?
        .into_iter()
        .map(|w| (w.week, w.col))
        .collect();

    let mut populated = Vec::with_capacity(template.len());
    let mut missing_weeks = 0usize;

    for (index, mut row) in template.into_iter().enumerate() {
        let (_, week) = parse_week_label(&row.week_num).ok_or_else(|| {
            PipelineError::SchemaMismatch(format!(
                "Template row {index}: invalid week_num '{}'",
                row.week_num
            ))
        })?;

        let Some(start_row) = layout.start_row(row.metric_code) else {
            warn!(
                "Metric code {} not in sheet layout, leaving template row {} unchanged",
                row.metric_code, index
            );
            populated.push(row);
            continue;
        };

        row.value = match week_to_col.get(&week) {
            Some(&col) => {
                let data_row = start_row + weekday_offset(row.date_time) as usize;
                cell_text(cell_at(range, data_row, col))
            }
            None => {
                missing_weeks += 1;
                None
            }
        };
        populated.push(row);
    }

    if missing_weeks > 0 {
        debug!(
            "{} template rows reference weeks absent from the sheet header",
            missing_weeks
        );
    }
    info!("Populated {} template rows", populated.len());
    Ok(populated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sheet() -> Range<Data> {
        let mut range = Range::new((0, 0), (89, 3));
        range.set_value((3, 2), Data::Int(10));
        range.set_value((3, 3), Data::Int(11));
        // sys_ph Wednesday of week 11
        range.set_value((30, 3), Data::Float(6.8));
        range
    }

    #[test]
    fn test_build_template_covers_every_combination() {
        let rows = build_template("GH1", 2025, 1..=52, WeekConvention::Iso).unwrap();
        assert_eq!(rows.len(), 8 * 52 * 7);
        assert!(rows.iter().all(|r| r.value.is_none() && r.location == "GH1"));
        assert_eq!(rows[0].week_num, "2025-01");
    }

    #[test]
    fn test_retarget_template_clears_values() {
        let mut rows = build_template("GH4", 2025, 1..=2, WeekConvention::Iso).unwrap();
        rows[0].value = Some("1200".to_string());

        let retargeted = retarget_template(&rows, "GH3");
        assert_eq!(retargeted.len(), rows.len());
        assert!(retargeted.iter().all(|r| r.value.is_none() && r.location == "GH3"));
        assert_eq!(retargeted[0].date_time, rows[0].date_time);
        assert_eq!(retargeted[0].week_num, rows[0].week_num);
    }

    #[test]
    fn test_template_location_matches_extractor_casing() {
        let built = build_template("Nursery", 2025, 1..=1, WeekConvention::Iso).unwrap();
        assert!(built.iter().all(|r| r.location == "NURSERY"));

        let retargeted = retarget_template(&built, "gh2");
        assert!(retargeted.iter().all(|r| r.location == "GH2"));
    }

    #[test]
    fn test_populate_template_joins_on_metric_week_and_weekday() {
        let template = build_template("GH2", 2025, 10..=12, WeekConvention::Iso).unwrap();
        let populated = populate_template(template, &sheet(), &SheetLayout::default()).unwrap();

        assert_eq!(populated.len(), 8 * 3 * 7);
        let filled: Vec<_> = populated.iter().filter(|r| r.value.is_some()).collect();
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].metric_code, MetricCode::SysPh);
        assert_eq!(filled[0].value.as_deref(), Some("6.8"));
        assert_eq!(
            filled[0].date_time,
            NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
        );
    }

    #[test]
    fn test_populate_template_week_absent_from_header_is_null() {
        let mut template = build_template("GH2", 2025, 12..=12, WeekConvention::Iso).unwrap();
        for row in &mut template {
            row.value = Some("stale".to_string());
        }
        let populated = populate_template(template, &sheet(), &SheetLayout::default()).unwrap();
        assert!(populated.iter().all(|r| r.value.is_none()));
    }

    #[test]
    fn test_populate_template_invalid_week_label() {
        let mut template = build_template("GH2", 2025, 10..=10, WeekConvention::Iso).unwrap();
        template[0].week_num = "week ten".to_string();
        assert!(matches!(
            populate_template(template, &sheet(), &SheetLayout::default()),
            Err(PipelineError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_populate_template_metric_missing_from_layout_keeps_row() {
        let mut layout = SheetLayout::default();
        layout.metric_start_rows.remove(&MetricCode::SysPh);

        let mut template = build_template("GH2", 2025, 11..=11, WeekConvention::Iso).unwrap();
        for row in template.iter_mut().filter(|r| r.metric_code == MetricCode::SysPh) {
            row.value = Some("7.1".to_string());
        }
        let populated = populate_template(template, &sheet(), &layout).unwrap();
        assert!(populated
            .iter()
            .filter(|r| r.metric_code == MetricCode::SysPh)
            .all(|r| r.value.as_deref() == Some("7.1")));
    }
}
