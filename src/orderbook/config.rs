//! Per-book behaviour switches.

use super::error::BookError;
use serde::{Deserialize, Serialize};

/// Default number of order slots reserved for order-log books.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 65_536;

/// How a book interprets incoming entries.
///
/// All books of one connector share the same `BookConfig`, since the
/// semantics follow the venue protocol rather than the instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Maximum number of levels kept per side. `None` keeps every level.
    pub max_depth: Option<usize>,

    /// `New` at an existing price keeps `max(old, new)` instead of adding.
    pub full_amount: bool,

    /// Track individual orders (order-log feeds).
    pub order_registry: bool,

    /// Number of order slots when `order_registry` is set.
    pub registry_capacity: usize,

    /// The venue only sends `Change` for partial fills; a price in a
    /// `Change` is never a replace.
    pub change_is_part_fill: bool,

    /// Report sequences are gap-free, so a `Change`/`Delete` for an unknown
    /// order is a protocol error rather than a reference to a forgotten one.
    pub continuous_rpt_seqs: bool,

    /// Stale sequence numbers produce `UpdateEffect::Error` instead of
    /// `UpdateEffect::None`.
    pub strict_sequencing: bool,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(20),
            full_amount: false,
            order_registry: false,
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            change_is_part_fill: true,
            continuous_rpt_seqs: false,
            strict_sequencing: false,
        }
    }
}

impl BookConfig {
    /// Aggregated-levels book bounded to `depth` levels per side.
    pub fn aggregated(depth: usize) -> Self {
        Self {
            max_depth: Some(depth),
            ..Default::default()
        }
    }

    /// Unbounded order-log book with the given slot capacity.
    pub fn order_log(capacity: usize) -> Self {
        Self {
            max_depth: None,
            order_registry: true,
            registry_capacity: capacity,
            ..Default::default()
        }
    }

    /// Sets full-amount semantics for `New`.
    #[must_use]
    pub fn with_full_amount(mut self, full_amount: bool) -> Self {
        self.full_amount = full_amount;
        self
    }

    /// Sets the maximum depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets whether `Change` is always a partial fill.
    #[must_use]
    pub fn with_change_is_part_fill(mut self, change_is_part_fill: bool) -> Self {
        self.change_is_part_fill = change_is_part_fill;
        self
    }

    /// Sets whether report sequences are continuous.
    #[must_use]
    pub fn with_continuous_rpt_seqs(mut self, continuous: bool) -> Self {
        self.continuous_rpt_seqs = continuous;
        self
    }

    /// Sets strict sequencing.
    #[must_use]
    pub fn with_strict_sequencing(mut self, strict: bool) -> Self {
        self.strict_sequencing = strict;
        self
    }

    /// Checks the combination of switches.
    ///
    /// # Errors
    /// Returns [`BookError::InvalidConfig`] when an order registry is combined
    /// with a bounded depth (orders outside the visible depth would be lost),
    /// when the registry has no capacity, or when the depth is zero.
    pub fn validate(&self) -> Result<(), BookError> {
        if self.max_depth == Some(0) {
            return Err(BookError::invalid_config("max_depth must be positive"));
        }
        if self.order_registry {
            if self.max_depth.is_some() {
                return Err(BookError::invalid_config(
                    "order registry requires an unbounded book (max_depth = null)",
                ));
            }
            if self.registry_capacity == 0 {
                return Err(BookError::invalid_config(
                    "registry_capacity must be positive",
                ));
            }
        }
        Ok(())
    }
}
