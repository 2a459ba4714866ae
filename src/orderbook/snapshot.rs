//! Order book snapshots for recorders and replay

use super::book::OrderBook;
use super::error::BookError;
use super::types::{BookSide, PriceLevel, SeqNums, UpdateEffect};
use crate::utils::current_time_nanos;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::trace;

/// Format version used for checksum-protected snapshots.
pub const BOOK_SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A copy of the visible levels of a book at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Instrument symbol
    pub symbol: String,

    /// Wall-clock time the snapshot was taken (nanoseconds since epoch)
    pub timestamp_ns: u64,

    /// Last applied feed sequence number
    pub last_seq_num: u64,

    /// Last applied report sequence
    pub last_rpt_seq: u64,

    /// Bid levels, best first
    pub bids: Vec<PriceLevel>,

    /// Ask levels, best first
    pub asks: Vec<PriceLevel>,
}

impl BookSnapshot {
    /// Best bid level
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    /// Best ask level
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    /// Average of best bid and best ask
    pub fn mid_price(&self) -> Option<f64> {
        let mid = match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        };
        trace!("mid_price: {:?}", mid);
        mid
    }

    /// Sum of quantities on one side
    pub fn total_volume(&self, side: BookSide) -> f64 {
        let levels = match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        };
        levels.iter().map(|level| level.qty).sum()
    }
}

/// Wrapper that adds a version and a SHA-256 checksum to a [`BookSnapshot`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshotPackage {
    /// Snapshot schema version
    pub version: u32,
    /// Snapshot payload
    pub snapshot: BookSnapshot,
    /// Hex-encoded checksum of the serialized snapshot
    pub checksum: String,
}

impl BookSnapshotPackage {
    /// Wraps `snapshot`, computing its checksum.
    pub fn new(snapshot: BookSnapshot) -> Result<Self, BookError> {
        let checksum = Self::compute_checksum(&snapshot)?;
        Ok(Self {
            version: BOOK_SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    /// Serializes the package to JSON.
    pub fn to_json(&self) -> Result<String, BookError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes a package from JSON without validating it.
    pub fn from_json(data: &str) -> Result<Self, BookError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Checks version and checksum.
    pub fn validate(&self) -> Result<(), BookError> {
        if self.version != BOOK_SNAPSHOT_FORMAT_VERSION {
            return Err(BookError::Serialization {
                message: format!(
                    "unsupported snapshot version {} (expected {})",
                    self.version, BOOK_SNAPSHOT_FORMAT_VERSION
                ),
            });
        }
        let computed = Self::compute_checksum(&self.snapshot)?;
        if computed != self.checksum {
            return Err(BookError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }
        Ok(())
    }

    /// Validates and unwraps the snapshot.
    pub fn into_snapshot(self) -> Result<BookSnapshot, BookError> {
        self.validate()?;
        Ok(self.snapshot)
    }

    fn compute_checksum(snapshot: &BookSnapshot) -> Result<String, BookError> {
        let payload = serde_json::to_vec(snapshot)?;
        let mut hasher = Sha256::new();
        hasher.update(payload);
        let digest = hasher.finalize();
        Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }
}

impl OrderBook {
    /// Copy up to `depth` levels per side (`0` copies everything).
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        let take = |levels: &[PriceLevel]| {
            let n = if depth == 0 {
                levels.len()
            } else {
                depth.min(levels.len())
            };
            levels[..n].to_vec()
        };
        BookSnapshot {
            symbol: self.symbol().to_string(),
            timestamp_ns: current_time_nanos(),
            last_seq_num: self.last_seq_num,
            last_rpt_seq: self.last_rpt_seq,
            bids: take(&self.bids),
            asks: take(&self.asks),
        }
    }

    /// Snapshot wrapped with a checksum.
    pub fn snapshot_package(&self, depth: usize) -> Result<BookSnapshotPackage, BookError> {
        BookSnapshotPackage::new(self.snapshot(depth))
    }

    /// Checksum-protected snapshot as JSON.
    pub fn snapshot_to_json(&self, depth: usize) -> Result<String, BookError> {
        self.snapshot_package(depth)?.to_json()
    }

    /// Replace the book content with `snapshot`.
    ///
    /// Every level is validated first; on error the book is left as it was.
    /// Levels then go through the normal insertion path, so depth limits
    /// apply. Order slots are dropped since a snapshot only carries
    /// aggregated levels.
    pub fn restore_from_snapshot(&mut self, snapshot: &BookSnapshot) -> Result<UpdateEffect, BookError> {
        if snapshot.symbol != self.symbol() {
            return Err(BookError::invalid_config(format!(
                "snapshot symbol {} does not match book {}",
                snapshot.symbol,
                self.symbol()
            )));
        }
        for (side, levels) in [(BookSide::Bid, &snapshot.bids), (BookSide::Ask, &snapshot.asks)] {
            if let Some(level) = levels
                .iter()
                .find(|level| !level.price.is_finite() || !(level.qty.is_finite() && level.qty > 0.0))
            {
                return Err(BookError::malformed(format!(
                    "snapshot {} level {} x {}",
                    side, level.price, level.qty
                )));
            }
        }
        let mut effect = self.clear(SeqNums::new(snapshot.last_rpt_seq, snapshot.last_seq_num));
        for (side, levels) in [(BookSide::Bid, &snapshot.bids), (BookSide::Ask, &snapshot.asks)] {
            for level in levels {
                effect.accumulate(self.adjust_level(side, level.price, level.qty, true)?);
            }
        }
        Ok(effect)
    }

    /// Restore from a checksum-protected JSON package.
    pub fn restore_from_snapshot_json(&mut self, data: &str) -> Result<UpdateEffect, BookError> {
        let snapshot = BookSnapshotPackage::from_json(data)?.into_snapshot()?;
        self.restore_from_snapshot(&snapshot)
    }
}
