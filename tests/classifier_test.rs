// Integration tests for classification over merged tidy tables

use chrono::NaiveDate;
use hydronomics_pipeline::metrics::{MetricCode, RangeTable};
use hydronomics_pipeline::models::{ClassifiedRecord, Status, TidyRecord};
use hydronomics_pipeline::services::Classifier;
use hydronomics_pipeline::tidy_csv;

fn record(metric: MetricCode, day: u32, value: Option<&str>, location: &str) -> TidyRecord {
    TidyRecord {
        metric_code: metric,
        date_time: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
        week_num: "2025-19".to_string(),
        value: value.map(str::to_string),
        location: location.to_string(),
    }
}

fn location_table(location: &str) -> Vec<TidyRecord> {
    vec![
        record(MetricCode::SysEc, 5, Some("abc"), location),
        record(MetricCode::SysEc, 6, Some("-5"), location),
        record(MetricCode::SysEc, 7, Some("500"), location),
        record(MetricCode::SysEc, 8, Some("1000"), location),
        record(MetricCode::SysEc, 9, Some("15000"), location),
        record(MetricCode::SysPh, 5, Some("15"), location),
        record(MetricCode::SysPh, 6, Some("7.0"), location),
        record(MetricCode::SysGhRh, 5, None, location),
    ]
}

#[test]
fn test_documented_examples() {
    let classified = Classifier::new(RangeTable::default()).classify_all(location_table("GH1"));
    let statuses: Vec<Option<Status>> = classified.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            Some(Status::NonNumeric),
            Some(Status::OutOfRange),
            Some(Status::LowEcToVerify),
            None,
            Some(Status::OutOfRange),
            Some(Status::OutOfRange),
            None,
            Some(Status::NonNumeric),
        ]
    );
}

#[test]
fn test_classification_is_location_independent() {
    let classifier = Classifier::default();
    let locations = ["GH1", "GH2", "NURSERY"];

    let merged: Vec<TidyRecord> = locations.iter().flat_map(|l| location_table(l)).collect();
    let merged_then_classified = classifier.classify_all(merged);

    let classified_then_merged: Vec<ClassifiedRecord> = locations
        .iter()
        .flat_map(|l| classifier.classify_all(location_table(l)))
        .collect();

    assert_eq!(merged_then_classified, classified_then_merged);
}

#[test]
fn test_classification_is_idempotent() {
    let classifier = Classifier::default();
    let once = classifier.classify_all(location_table("GH3"));
    let twice = classifier.classify_all(once.iter().cloned().map(ClassifiedRecord::into_tidy).collect());
    assert_eq!(once, twice);
}

#[test]
fn test_merge_and_classify_files() {
    let dir = tempfile::tempdir().unwrap();
    let gh1 = dir.path().join("Hydronomics Data gh1.csv");
    let gh2 = dir.path().join("Hydronomics Data gh2.csv");
    let merged_path = dir.path().join("Hydronomics Data Merged.csv");

    tidy_csv::write_tidy(&gh1, &location_table("GH1")).unwrap();
    tidy_csv::write_tidy(&gh2, &location_table("GH2")).unwrap();

    let merged = tidy_csv::merge_files(&[gh1, gh2]).unwrap();
    assert_eq!(merged.len(), 16);

    let classified = Classifier::default().classify_all(merged);
    tidy_csv::write_classified(&merged_path, &classified).unwrap();

    let contents = std::fs::read_to_string(&merged_path).unwrap();
    assert!(contents.starts_with("metric_code,date_time,week_num,value,location,status\n"));
    assert!(contents.contains("sys_ec,2025-05-05,2025-19,abc,GH2,non-numeric\n"));
    assert!(contents.contains("sys_ph,2025-05-06,2025-19,7.0,GH1,\n"));

    let reloaded = tidy_csv::read_classified(&merged_path).unwrap();
    assert_eq!(reloaded, classified);

    // Re-reading the classified file as tidy ignores the status column
    let reclassified = Classifier::default().classify_all(tidy_csv::read_tidy(&merged_path).unwrap());
    assert_eq!(reclassified, classified);
}
