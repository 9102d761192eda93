use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::metrics::{MetricCode, RangeTable};
use crate::models::{coerce_numeric, ClassifiedRecord, Status, TidyRecord};

/// Assigns a qualitative status to each reading from the metric range table
///
/// Rules, first match wins:
/// 1. value does not coerce to a number -> `non-numeric`
/// 2. value outside `[min, max]` -> `out-of-range`
/// 3. EC metric below its low threshold -> `low-ec-to-verify`
/// 4. otherwise normal (no status)
///
/// Metrics without a range are left unclassified.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    ranges: RangeTable,
}

impl Classifier {
    pub fn new(ranges: RangeTable) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &RangeTable {
        &self.ranges
    }

    pub fn classify_value(&self, metric: MetricCode, value: Option<&str>) -> Option<Status> {
        let Some(number) = coerce_numeric(value) else {
            return Some(Status::NonNumeric);
        };
        let range = self.ranges.get(metric)?;

        if !range.contains(number) {
            return Some(Status::OutOfRange);
        }
        match range.low_threshold {
            Some(threshold) if metric.is_ec() && number < threshold => Some(Status::LowEcToVerify),
            _ => None,
        }
    }

    pub fn classify(&self, record: TidyRecord) -> ClassifiedRecord {
        let status = self.classify_value(record.metric_code, record.value.as_deref());
        ClassifiedRecord::new(record, status)
    }

    /// Classify a whole table, preserving row order
    pub fn classify_all(&self, records: Vec<TidyRecord>) -> Vec<ClassifiedRecord> {
        let classified: Vec<ClassifiedRecord> =
            records.into_iter().map(|r| self.classify(r)).collect();

        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for record in &classified {
            let label = record.status.map(|s| s.as_str()).unwrap_or("normal");
            *counts.entry(label).or_default() += 1;
        }
        info!("Classified {} records: {:?}", classified.len(), counts);
        debug!("Range table covers {} metrics", self.ranges.len());
        classified
    }
}
