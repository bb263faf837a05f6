//! Metric derivation from persisted records.
//!
//! Counters: one sample per record carrying the running count so far.
//! Histogram: for each bucket bound, one sample per record whose duration fits
//! under the bound, carrying that bucket's own running count. Buckets are
//! counted independently of each other.

use crate::record::{ExecutionRecord, RecordSet, StageRecord};
use std::collections::BTreeMap;

pub const RECORD_INGEST: &str = "record_ingest";
pub const USE_CASE_EXECS: &str = "use_case_execs";

pub const LABEL_APP_NAME: &str = "appName";
pub const LABEL_LE: &str = "le";

/// Execution-duration bucket upper bounds, in seconds.
pub const HISTOGRAM_BUCKETS: [u32; 8] = [1, 5, 10, 20, 30, 40, 50, 60];

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    /// Epoch seconds.
    pub timestamp: i64,
    /// Sorted by key so rendering is deterministic.
    pub labels: BTreeMap<String, String>,
}

/// Derived samples per collection, in the order the exposition writer emits them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    pub ingest: Vec<Metric>,
    pub correlation: Vec<Metric>,
    pub escalation: Vec<Metric>,
    pub use_cases: Vec<Metric>,
}

impl MetricSet {
    pub fn sample_count(&self) -> usize {
        self.ingest.len() + self.correlation.len() + self.escalation.len() + self.use_cases.len()
    }
}

pub fn derive_metrics(records: &RecordSet) -> MetricSet {
    MetricSet {
        ingest: counter_metrics(&records.ingest),
        correlation: counter_metrics(&records.correlation),
        escalation: counter_metrics(&records.escalation),
        use_cases: execution_histogram(&records.executions),
    }
}

/// Running `record_ingest` count in source order.
pub fn counter_metrics<T: StageRecord>(records: &[T]) -> Vec<Metric> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| Metric {
            name: RECORD_INGEST.to_string(),
            value: (i + 1) as f64,
            timestamp: record.created_at().timestamp(),
            labels: BTreeMap::from([(
                LABEL_APP_NAME.to_string(),
                record.application_name().to_string(),
            )]),
        })
        .collect()
}

pub fn execution_histogram(records: &[ExecutionRecord]) -> Vec<Metric> {
    let mut metrics = Vec::new();
    for bound in HISTOGRAM_BUCKETS {
        let le = format!("{:.6}", f64::from(bound));
        let mut count = 0u64;
        for record in records.iter().filter(|r| r.duration <= bound) {
            count += 1;
            metrics.push(Metric {
                name: USE_CASE_EXECS.to_string(),
                value: count as f64,
                timestamp: record.created_at.timestamp(),
                labels: BTreeMap::from([
                    (LABEL_LE.to_string(), le.clone()),
                    (LABEL_APP_NAME.to_string(), record.application_name.clone()),
                ]),
            });
        }
    }
    metrics
}
