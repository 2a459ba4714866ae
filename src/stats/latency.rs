//! Five-stage latency recorder for notified book updates.

use super::sink::{HistogramStats, RunningStats, StatsSink, StatsSummary};
use crate::orderbook::error::BookError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Samples above one second are clamped to it.
pub const MAX_LATENCY_NS: u64 = 1_000_000_000;

/// Stage boundaries of the update pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LatencyStage {
    /// NIC hardware timestamp to socket read
    HwToSocket,
    /// Socket read to handler start
    SocketToHandler,
    /// Handler start to book update
    HandlerToBook,
    /// Book update to strategy callback
    BookToStrategy,
    /// First available receipt timestamp to strategy callback
    EndToEnd,
}

impl LatencyStage {
    /// Every stage, in pipeline order.
    pub const ALL: [LatencyStage; 5] = [
        LatencyStage::HwToSocket,
        LatencyStage::SocketToHandler,
        LatencyStage::HandlerToBook,
        LatencyStage::BookToStrategy,
        LatencyStage::EndToEnd,
    ];

    /// Stable label, also used for metric names.
    pub fn as_str(self) -> &'static str {
        match self {
            LatencyStage::HwToSocket => "hw_to_socket",
            LatencyStage::SocketToHandler => "socket_to_handler",
            LatencyStage::HandlerToBook => "handler_to_book",
            LatencyStage::BookToStrategy => "book_to_strategy",
            LatencyStage::EndToEnd => "end_to_end",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LatencyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which [`StatsSink`] backs each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencySinkKind {
    /// [`RunningStats`]
    #[default]
    Running,
    /// [`HistogramStats`]
    Histogram,
    /// `MetricsSink`, needs the `metrics` feature
    Metrics,
}

/// Timestamps (ns) of one update as it moved through the pipeline. Zero
/// means the timestamp is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineTimestamps {
    /// NIC hardware receipt
    pub hw_ts: u64,
    /// Socket read
    pub socket_ts: u64,
    /// Handler start
    pub handler_ts: u64,
    /// Book updated
    pub book_ts: u64,
    /// Strategy about to be called
    pub strategy_ts: u64,
}

/// Per-stage latency statistics.
#[derive(Debug)]
pub struct LatencyStats {
    sinks: [Box<dyn StatsSink>; 5],
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    /// Running statistics for every stage.
    pub fn new() -> Self {
        Self::with_sinks(|_| Box::new(RunningStats::new()))
    }

    /// Builds one sink per stage with `factory`.
    pub fn with_sinks<F>(mut factory: F) -> Self
    where
        F: FnMut(LatencyStage) -> Box<dyn StatsSink>,
    {
        Self {
            sinks: LatencyStage::ALL.map(&mut factory),
        }
    }

    /// Builds the sinks selected by configuration.
    ///
    /// Without the `metrics` feature, [`LatencySinkKind::Metrics`] falls back
    /// to running statistics with a warning.
    ///
    /// # Errors
    /// Propagates histogram allocation failures.
    pub fn from_kind(kind: LatencySinkKind) -> Result<Self, BookError> {
        match kind {
            LatencySinkKind::Running => Ok(Self::new()),
            LatencySinkKind::Histogram => Ok(Self {
                sinks: [
                    Box::new(HistogramStats::new()?),
                    Box::new(HistogramStats::new()?),
                    Box::new(HistogramStats::new()?),
                    Box::new(HistogramStats::new()?),
                    Box::new(HistogramStats::new()?),
                ],
            }),
            #[cfg(feature = "metrics")]
            LatencySinkKind::Metrics => Ok(Self::with_sinks(|stage| {
                Box::new(super::metrics::MetricsSink::new(stage))
            })),
            #[cfg(not(feature = "metrics"))]
            LatencySinkKind::Metrics => {
                tracing::warn!("metrics feature disabled, using running latency statistics");
                Ok(Self::new())
            }
        }
    }

    /// Records `end_ns - start_ns` for `stage`.
    ///
    /// Nothing is recorded when `start_ns` is 0. Negative intervals count as
    /// zero and long ones are clamped to [`MAX_LATENCY_NS`].
    #[inline]
    pub fn record(&mut self, stage: LatencyStage, start_ns: u64, end_ns: u64) {
        if start_ns == 0 {
            return;
        }
        let sample = end_ns.saturating_sub(start_ns).min(MAX_LATENCY_NS);
        self.sinks[stage.index()].record(sample);
    }

    /// Records every stage of one notified update.
    pub fn record_pipeline(&mut self, ts: &PipelineTimestamps) {
        self.record(LatencyStage::HwToSocket, ts.hw_ts, ts.socket_ts);
        self.record(LatencyStage::SocketToHandler, ts.socket_ts, ts.handler_ts);
        self.record(LatencyStage::HandlerToBook, ts.handler_ts, ts.book_ts);
        self.record(LatencyStage::BookToStrategy, ts.book_ts, ts.strategy_ts);
        let start = [ts.hw_ts, ts.socket_ts, ts.handler_ts]
            .into_iter()
            .find(|&t| t != 0)
            .unwrap_or(0);
        self.record(LatencyStage::EndToEnd, start, ts.strategy_ts);
    }

    /// Summary of one stage.
    pub fn stage(&self, stage: LatencyStage) -> StatsSummary {
        self.sinks[stage.index()].summary()
    }

    /// Summary of every stage.
    pub fn report(&self) -> LatencyReport {
        LatencyReport {
            hw_to_socket: self.stage(LatencyStage::HwToSocket),
            socket_to_handler: self.stage(LatencyStage::SocketToHandler),
            handler_to_book: self.stage(LatencyStage::HandlerToBook),
            book_to_strategy: self.stage(LatencyStage::BookToStrategy),
            end_to_end: self.stage(LatencyStage::EndToEnd),
        }
    }

    /// Clears every stage.
    pub fn reset(&mut self) {
        for sink in &mut self.sinks {
            sink.reset();
        }
    }
}

/// Serializable per-stage summaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyReport {
    /// NIC to socket
    pub hw_to_socket: StatsSummary,
    /// Socket to handler
    pub socket_to_handler: StatsSummary,
    /// Handler to book
    pub handler_to_book: StatsSummary,
    /// Book to strategy
    pub book_to_strategy: StatsSummary,
    /// End to end
    pub end_to_end: StatsSummary,
}

impl LatencyReport {
    /// JSON rendering of the report.
    pub fn to_json(&self) -> Result<String, BookError> {
        Ok(serde_json::to_string(self)?)
    }
}
