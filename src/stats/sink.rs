//! Storage backends for latency samples.

use crate::orderbook::error::BookError;
use hdrhistogram::Histogram;
use serde::Serialize;
use std::fmt;

use super::latency::MAX_LATENCY_NS;

/// Summary of the samples recorded by a sink.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StatsSummary {
    /// Number of samples
    pub count: u64,
    /// Smallest sample (ns)
    pub min: u64,
    /// Largest sample (ns)
    pub max: u64,
    /// Mean (ns)
    pub mean: f64,
    /// Standard deviation (ns)
    pub std_dev: f64,
    /// Median, for sinks that keep a distribution
    pub p50: Option<u64>,
    /// 99th percentile, for sinks that keep a distribution
    pub p99: Option<u64>,
}

/// Destination of latency samples for one pipeline stage.
///
/// The pipeline only ever calls [`StatsSink::record`] on the hot path.
pub trait StatsSink: fmt::Debug + Send {
    /// Folds one sample (nanoseconds, already clamped) into the sink.
    fn record(&mut self, value_ns: u64);

    /// Current summary.
    fn summary(&self) -> StatsSummary;

    /// Forgets every sample.
    fn reset(&mut self);
}

/// Count, extremes, mean and variance using Welford's online update.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    min: u64,
    max: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Creates empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample variance (0 with fewer than two samples).
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }
}

impl StatsSink for RunningStats {
    #[inline]
    fn record(&mut self, value_ns: u64) {
        if self.count == 0 {
            self.min = value_ns;
            self.max = value_ns;
        } else {
            self.min = self.min.min(value_ns);
            self.max = self.max.max(value_ns);
        }
        self.count += 1;
        let value = value_ns as f64;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn summary(&self) -> StatsSummary {
        StatsSummary {
            count: self.count,
            min: self.min,
            max: self.max,
            mean: self.mean,
            std_dev: self.variance().sqrt(),
            p50: None,
            p99: None,
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// HDR histogram with three significant digits up to [`MAX_LATENCY_NS`].
pub struct HistogramStats {
    histogram: Histogram<u64>,
}

impl HistogramStats {
    /// Creates an empty histogram.
    ///
    /// # Errors
    /// [`BookError::InvalidConfig`] if the histogram cannot be allocated
    /// with the given bounds.
    pub fn new() -> Result<Self, BookError> {
        let histogram = Histogram::new_with_max(MAX_LATENCY_NS, 3)
            .map_err(|err| BookError::invalid_config(format!("latency histogram: {err}")))?;
        Ok(Self { histogram })
    }

    /// Value at quantile `q` (0.0..=1.0).
    pub fn value_at_quantile(&self, q: f64) -> u64 {
        self.histogram.value_at_quantile(q)
    }
}

impl fmt::Debug for HistogramStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistogramStats")
            .field("len", &self.histogram.len())
            .field("max", &self.histogram.max())
            .finish()
    }
}

impl StatsSink for HistogramStats {
    #[inline]
    fn record(&mut self, value_ns: u64) {
        self.histogram.saturating_record(value_ns);
    }

    fn summary(&self) -> StatsSummary {
        let count = self.histogram.len();
        if count == 0 {
            return StatsSummary::default();
        }
        StatsSummary {
            count,
            min: self.histogram.min(),
            max: self.histogram.max(),
            mean: self.histogram.mean(),
            std_dev: self.histogram.stdev(),
            p50: Some(self.histogram.value_at_quantile(0.5)),
            p99: Some(self.histogram.value_at_quantile(0.99)),
        }
    }

    fn reset(&mut self) {
        self.histogram.reset();
    }
}
