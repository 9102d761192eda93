/// Analysis reports over a classified table
///
/// All reports are plain aggregations; they serialize to JSON for machine use and
/// implement `Display` for the console.
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::metrics::MetricCode;
use crate::models::{ClassifiedRecord, Status};

/// A key together with its count, used for "most/least" answers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<K> {
    pub key: K,
    pub count: usize,
}

/// Largest count; ties go to the smallest key
fn most<K: Clone + Ord>(counts: &BTreeMap<K, usize>) -> Option<Ranked<K>> {
    let mut best: Option<Ranked<K>> = None;
    for (key, &count) in counts {
        if best.as_ref().map_or(true, |b| count > b.count) {
            best = Some(Ranked {
                key: key.clone(),
                count,
            });
        }
    }
    best
}

/// Smallest count; ties go to the smallest key
fn least<K: Clone + Ord>(counts: &BTreeMap<K, usize>) -> Option<Ranked<K>> {
    let mut best: Option<Ranked<K>> = None;
    for (key, &count) in counts {
        if best.as_ref().map_or(true, |b| count < b.count) {
            best = Some(Ranked {
                key: key.clone(),
                count,
            });
        }
    }
    best
}

fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSummary {
    pub total_records: usize,
    pub anomalies: usize,
    pub by_status: BTreeMap<Status, usize>,
    pub by_metric: BTreeMap<MetricCode, BTreeMap<Status, usize>>,
    pub by_location: BTreeMap<String, BTreeMap<Status, usize>>,
    pub most_out_of_range_metric: Option<Ranked<MetricCode>>,
    pub most_out_of_range_location: Option<Ranked<String>>,
    pub most_low_ec_metric: Option<Ranked<MetricCode>>,
    pub most_low_ec_location: Option<Ranked<String>>,
}

impl StatusSummary {
    pub fn from_records(records: &[ClassifiedRecord]) -> Self {
        let mut summary = StatusSummary {
            total_records: records.len(),
            ..Default::default()
        };

        let mut metric_counts: BTreeMap<Status, BTreeMap<MetricCode, usize>> = BTreeMap::new();
        let mut location_counts: BTreeMap<Status, BTreeMap<String, usize>> = BTreeMap::new();

        for record in records {
            let Some(status) = record.status else {
                continue;
            };
            summary.anomalies += 1;
            *summary.by_status.entry(status).or_default() += 1;
            *summary
                .by_metric
                .entry(record.metric_code)
                .or_default()
                .entry(status)
                .or_default() += 1;
            *summary
                .by_location
                .entry(record.location.clone())
                .or_default()
                .entry(status)
                .or_default() += 1;
            *metric_counts
                .entry(status)
                .or_default()
                .entry(record.metric_code)
                .or_default() += 1;
            *location_counts
                .entry(status)
                .or_default()
                .entry(record.location.clone())
                .or_default() += 1;
        }

        let out_of_range = Status::OutOfRange;
        let low_ec = Status::LowEcToVerify;
        summary.most_out_of_range_metric = metric_counts.get(&out_of_range).and_then(most);
        summary.most_out_of_range_location = location_counts.get(&out_of_range).and_then(most);
        summary.most_low_ec_metric = metric_counts.get(&low_ec).and_then(most);
        summary.most_low_ec_location = location_counts.get(&low_ec).and_then(most);
        summary
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Anomaly Analysis ---")?;
        if self.anomalies == 0 {
            return writeln!(f, "No anomalous data found.");
        }

        writeln!(f, "Total Anomalies by Status Type ({} of {} records):", self.anomalies, self.total_records)?;
        for (status, count) in &self.by_status {
            writeln!(f, "  {status:<18} {count}")?;
        }

        writeln!(f, "\nAnomalies by Metric and Status Type:")?;
        for (metric, statuses) in &self.by_metric {
            writeln!(f, "  {}: {}", metric, format_status_counts(statuses))?;
        }

        writeln!(f, "\nAnomalies by Greenhouse (Location) and Status Type:")?;
        for (location, statuses) in &self.by_location {
            writeln!(f, "  {}: {}", location, format_status_counts(statuses))?;
        }

        writeln!(f)?;
        write_leader(f, "Metric with most 'out-of-range' anomalies", &self.most_out_of_range_metric)?;
        write_leader(f, "Greenhouse with most 'out-of-range' anomalies", &self.most_out_of_range_location)?;
        write_leader(f, "Metric with most 'low-ec-to-verify' anomalies", &self.most_low_ec_metric)?;
        write_leader(f, "Greenhouse with most 'low-ec-to-verify' anomalies", &self.most_low_ec_location)
    }
}

fn format_status_counts(counts: &BTreeMap<Status, usize>) -> String {
    counts
        .iter()
        .map(|(status, count)| format!("{status}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_leader<K: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    leader: &Option<Ranked<K>>,
) -> fmt::Result {
    match leader {
        Some(r) => writeln!(f, "{label}: {} ({} occurrences)", r.key, r.count),
        None => writeln!(f, "{label}: none"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricNormalShare {
    pub metric_code: MetricCode,
    pub total_readings: usize,
    pub normal_readings: usize,
    pub percentage_normal: f64,
}

/// Share of normal readings per metric, highest first
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalRanking {
    pub metrics: Vec<MetricNormalShare>,
}

impl NormalRanking {
    pub fn from_records(records: &[ClassifiedRecord]) -> Self {
        let mut totals: BTreeMap<MetricCode, (usize, usize)> = BTreeMap::new();
        for record in records {
            let entry = totals.entry(record.metric_code).or_default();
            entry.0 += 1;
            if record.is_normal() {
                entry.1 += 1;
            }
        }

        let mut metrics: Vec<MetricNormalShare> = totals
            .into_iter()
            .map(|(metric_code, (total, normal))| MetricNormalShare {
                metric_code,
                total_readings: total,
                normal_readings: normal,
                percentage_normal: normal as f64 / total as f64 * 100.0,
            })
            .collect();
        metrics.sort_by(|a, b| {
            b.percentage_normal
                .total_cmp(&a.percentage_normal)
                .then(a.metric_code.as_str().cmp(b.metric_code.as_str()))
        });
        Self { metrics }
    }
}

impl fmt::Display for NormalRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Percentage of Normal Readings per Metric ---")?;
        writeln!(
            f,
            "{:<14} {:>14} {:>15} {:>17}",
            "metric_code", "total_readings", "normal_readings", "percentage_normal"
        )?;
        for m in &self.metrics {
            writeln!(
                f,
                "{:<14} {:>14} {:>15} {:>17.2}",
                m.metric_code.as_str(),
                m.total_readings,
                m.normal_readings,
                m.percentage_normal
            )?;
        }
        Ok(())
    }
}

/// Missing-value analysis; a value is missing when it does not coerce to a number
#[derive(Debug, Clone, Default, Serialize)]
pub struct Completeness {
    pub missing_total: usize,
    pub missing_by_location: BTreeMap<String, usize>,
    pub missing_by_metric: BTreeMap<MetricCode, usize>,
    pub missing_by_weekday: BTreeMap<String, usize>,
    pub least_missing_location: Option<Ranked<String>>,
    pub most_missing_metric: Option<Ranked<MetricCode>>,
    pub most_missing_weekday: Option<Ranked<String>>,
    pub most_missing_combination: Option<Ranked<String>>,
}

impl Completeness {
    pub fn from_records(records: &[ClassifiedRecord]) -> Self {
        let mut report = Completeness::default();
        let mut by_combination: BTreeMap<String, usize> = BTreeMap::new();

        for record in records {
            let missing = usize::from(record.numeric_value().is_none());
            let weekday = weekday_name(record.date_time);

            report.missing_total += missing;
            *report
                .missing_by_location
                .entry(record.location.clone())
                .or_default() += missing;
            *report.missing_by_metric.entry(record.metric_code).or_default() += missing;
            *report
                .missing_by_weekday
                .entry(weekday.to_string())
                .or_default() += missing;
            *by_combination
                .entry(format!("{} / {} / {}", record.metric_code, record.location, weekday))
                .or_default() += missing;
        }

        report.least_missing_location = least(&report.missing_by_location);
        report.most_missing_metric = most(&report.missing_by_metric);
        report.most_missing_weekday = most(&report.missing_by_weekday);
        report.most_missing_combination = most(&by_combination);
        report
    }
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Completeness Analysis (Missing Values) ---")?;
        writeln!(f, "Total missing values: {}", self.missing_total)?;
        write_leader(f, "Greenhouse with the least missing values", &self.least_missing_location)?;
        write_leader(f, "Metric with the most missing values", &self.most_missing_metric)?;
        write_leader(f, "Day of the week with the most missing values", &self.most_missing_weekday)?;
        write_leader(
            f,
            "Combined (Metric, Greenhouse, Day) with most missing values",
            &self.most_missing_combination,
        )
    }
}

/// A numeric reading pulled out for review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedReading {
    pub metric_code: MetricCode,
    pub location: String,
    pub date_time: NaiveDate,
    pub week_num: String,
    pub value: f64,
}

impl FlaggedReading {
    fn from_record(record: &ClassifiedRecord, value: f64) -> Self {
        Self {
            metric_code: record.metric_code,
            location: record.location.clone(),
            date_time: record.date_time,
            week_num: record.week_num.clone(),
            value,
        }
    }
}

/// EC readings strictly below `threshold`, sorted by metric then value
pub fn low_ec_readings(records: &[ClassifiedRecord], threshold: f64) -> Vec<FlaggedReading> {
    let mut readings: Vec<FlaggedReading> = records
        .iter()
        .filter(|r| r.metric_code.is_ec())
        .filter_map(|r| {
            r.numeric_value()
                .filter(|v| *v < threshold)
                .map(|v| FlaggedReading::from_record(r, v))
        })
        .collect();
    readings.sort_by(|a, b| {
        a.metric_code
            .as_str()
            .cmp(b.metric_code.as_str())
            .then(a.value.total_cmp(&b.value))
    });
    readings
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeViolationGroup {
    pub location: String,
    pub metric_code: MetricCode,
    pub metric_name: &'static str,
    pub entries: Vec<FlaggedReading>,
}

/// Out-of-range readings grouped by location then metric
pub fn range_violations(records: &[ClassifiedRecord]) -> Vec<RangeViolationGroup> {
    let mut groups: BTreeMap<(String, MetricCode), Vec<FlaggedReading>> = BTreeMap::new();
    for record in records {
        if record.status != Some(Status::OutOfRange) {
            continue;
        }
        if let Some(value) = record.numeric_value() {
            groups
                .entry((record.location.clone(), record.metric_code))
                .or_default()
                .push(FlaggedReading::from_record(record, value));
        }
    }

    groups
        .into_iter()
        .map(|((location, metric_code), entries)| RangeViolationGroup {
            location,
            metric_code,
            metric_name: metric_code.display_name(),
            entries,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TidyRecord;
    use crate::services::Classifier;

    fn classified(metric: MetricCode, day: u32, value: Option<&str>, location: &str) -> ClassifiedRecord {
        let record = TidyRecord {
            metric_code: metric,
            // 2025-03-03 is a Monday
            date_time: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            week_num: "2025-10".to_string(),
            value: value.map(str::to_string),
            location: location.to_string(),
        };
        Classifier::default().classify(record)
    }

    fn sample() -> Vec<ClassifiedRecord> {
        vec![
            classified(MetricCode::SysEc, 3, Some("500"), "GH1"),
            classified(MetricCode::SysEc, 4, Some("1500"), "GH1"),
            classified(MetricCode::SysEc, 5, Some("-3"), "GH2"),
            classified(MetricCode::FwaterEc, 3, Some("200"), "GH2"),
            classified(MetricCode::SysPh, 3, Some("15"), "GH2"),
            classified(MetricCode::SysPh, 4, None, "GH1"),
            classified(MetricCode::SysPh, 5, Some("6.5"), "GH1"),
        ]
    }

    #[test]
    fn test_status_summary_counts() {
        let summary = StatusSummary::from_records(&sample());
        assert_eq!(summary.total_records, 7);
        assert_eq!(summary.anomalies, 5);
        assert_eq!(summary.by_status[&Status::OutOfRange], 2);
        assert_eq!(summary.by_status[&Status::LowEcToVerify], 2);
        assert_eq!(summary.by_status[&Status::NonNumeric], 1);

        let out_of_range = summary.most_out_of_range_location.unwrap();
        assert_eq!(out_of_range.key, "GH2");
        assert_eq!(out_of_range.count, 2);
        // fwater_ec and sys_ec tie at one low reading each; smallest key wins
        assert_eq!(summary.most_low_ec_metric.unwrap().key, MetricCode::SysEc);
    }

    #[test]
    fn test_status_summary_no_anomalies() {
        let records = vec![classified(MetricCode::SysPh, 3, Some("7"), "GH1")];
        let summary = StatusSummary::from_records(&records);
        assert_eq!(summary.anomalies, 0);
        assert!(summary.most_out_of_range_metric.is_none());
        assert!(summary.to_string().contains("No anomalous data found."));
    }

    #[test]
    fn test_normal_ranking_sorted_descending() {
        let ranking = NormalRanking::from_records(&sample());
        let order: Vec<MetricCode> = ranking.metrics.iter().map(|m| m.metric_code).collect();
        assert_eq!(
            order,
            vec![MetricCode::SysEc, MetricCode::SysPh, MetricCode::FwaterEc]
        );
        let sys_ph = &ranking.metrics[1];
        assert_eq!(sys_ph.total_readings, 3);
        assert_eq!(sys_ph.normal_readings, 1);
        assert!((sys_ph.percentage_normal - 33.333).abs() < 0.01);
        assert_eq!(ranking.metrics[2].percentage_normal, 0.0);
    }

    #[test]
    fn test_completeness() {
        let mut records = sample();
        records.push(classified(MetricCode::SysPh, 11, Some("n/a"), "GH1"));
        let report = Completeness::from_records(&records);

        assert_eq!(report.missing_total, 2);
        assert_eq!(report.missing_by_location["GH1"], 2);
        assert_eq!(report.least_missing_location.unwrap().key, "GH2");
        assert_eq!(report.most_missing_metric.unwrap().key, MetricCode::SysPh);
        // 2025-03-04 and 2025-03-11 are both Tuesdays
        let weekday = report.most_missing_weekday.unwrap();
        assert_eq!(weekday.key, "Tuesday");
        assert_eq!(weekday.count, 2);
        assert_eq!(
            report.most_missing_combination.unwrap().key,
            "sys_ph / GH1 / Tuesday"
        );
    }

    #[test]
    fn test_low_ec_readings_sorted_by_metric_then_value() {
        let mut records = sample();
        records.push(classified(MetricCode::SysEc, 6, Some("100"), "GH3"));
        let low = low_ec_readings(&records, 1000.0);

        let values: Vec<(MetricCode, f64)> = low.iter().map(|r| (r.metric_code, r.value)).collect();
        assert_eq!(
            values,
            vec![
                (MetricCode::FwaterEc, 200.0),
                (MetricCode::SysEc, -3.0),
                (MetricCode::SysEc, 100.0),
                (MetricCode::SysEc, 500.0),
            ]
        );
    }

    #[test]
    fn test_range_violations_grouped() {
        let groups = range_violations(&sample());
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.location == "GH2"));
        assert_eq!(groups[0].metric_code, MetricCode::SysEc);
        assert_eq!(groups[0].metric_name, "System EC");
        assert_eq!(groups[1].entries[0].value, 15.0);
    }

    #[test]
    fn test_reports_serialize_to_json() {
        let summary = StatusSummary::from_records(&sample());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["by_status"]["out-of-range"], 2);
        assert_eq!(json["most_out_of_range_location"]["key"], "GH2");
    }
}
