//! `metrics` crate integration.

use super::latency::LatencyStage;
use super::sink::{RunningStats, StatsSink, StatsSummary};
use metrics::{Histogram, counter, describe_counter, describe_histogram, histogram};
use std::fmt;
use std::sync::Once;

static DESCRIBE: Once = Once::new();

/// Registers descriptions for every metric the engine emits.
pub fn describe_metrics() {
    DESCRIBE.call_once(|| {
        describe_histogram!(
            "feedbook_latency_ns",
            "Pipeline stage latency of notified book updates in nanoseconds"
        );
        describe_counter!(
            "feedbook_entries_applied_total",
            "Normalized entries applied to books"
        );
        describe_counter!(
            "feedbook_entries_malformed_total",
            "Normalized entries rejected as malformed"
        );
        describe_counter!(
            "feedbook_books_corrected_total",
            "Crossed books repaired before notification"
        );
    });
}

/// Forwards samples to a `metrics` histogram labelled with the stage, and
/// keeps running statistics for [`StatsSink::summary`].
pub struct MetricsSink {
    histogram: Histogram,
    local: RunningStats,
}

impl MetricsSink {
    /// Creates the sink for `stage`.
    pub fn new(stage: LatencyStage) -> Self {
        describe_metrics();
        Self {
            histogram: histogram!("feedbook_latency_ns", "stage" => stage.as_str()),
            local: RunningStats::new(),
        }
    }
}

impl fmt::Debug for MetricsSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsSink")
            .field("local", &self.local)
            .finish()
    }
}

impl StatsSink for MetricsSink {
    fn record(&mut self, value_ns: u64) {
        self.histogram.record(value_ns as f64);
        self.local.record(value_ns);
    }

    fn summary(&self) -> StatsSummary {
        self.local.summary()
    }

    fn reset(&mut self) {
        self.local.reset();
    }
}

pub(crate) fn count_applied(n: u64) {
    counter!("feedbook_entries_applied_total").increment(n);
}

pub(crate) fn count_malformed() {
    counter!("feedbook_entries_malformed_total").increment(1);
}

pub(crate) fn count_correction() {
    counter!("feedbook_books_corrected_total").increment(1);
}
