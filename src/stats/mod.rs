//! Latency instrumentation of the notification path.

pub mod latency;
pub mod sink;

/// Exporters for the `metrics` facade.
#[cfg(feature = "metrics")]
pub mod metrics;

pub use latency::{
    LatencyReport, LatencySinkKind, LatencyStage, LatencyStats, MAX_LATENCY_NS, PipelineTimestamps,
};
#[cfg(feature = "metrics")]
pub use self::metrics::MetricsSink;
pub use sink::{HistogramStats, RunningStats, StatsSink, StatsSummary};
