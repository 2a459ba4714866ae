//! Consistency checks run on every dirty book before notification.

use super::config::ConnectorConfig;
use super::dirty::DirtyBook;
use crate::orderbook::book::OrderBook;
use crate::orderbook::types::UpdateEffect;
use tracing::warn;

/// Marks books initialized and repairs crossed books.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyVerifier {
    /// Any non-error update initializes the book (TCP-style and
    /// snapshot-only feeds)
    pub initialize_on_update: bool,
    /// Crossed books are tolerated
    pub relaxed: bool,
}

impl ConsistencyVerifier {
    /// Verifier matching a connector configuration.
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self {
            initialize_on_update: config.initializes_on_update(),
            relaxed: config.relaxed_books,
        }
    }

    /// Verifies `book` against its accumulated `dirty` state.
    ///
    /// Returns `false` when the book had to be repaired; `dirty` then carries
    /// `UpdateEffect::Error` and the sides touched by the repair.
    pub fn verify(&self, book: &mut OrderBook, dirty: &mut DirtyBook) -> bool {
        if self.initialize_on_update && !dirty.effect.is_error() {
            book.set_initialized(true);
        }
        if !book.is_initialized() || self.relaxed || !book.is_crossed() {
            return true;
        }

        let (bid, ask) = (book.best_bid(), book.best_ask());
        let corrected = book.correct_book();
        if let (Some(bid), Some(ask)) = (bid, ask) {
            warn!(
                "{}: crossed book corrected, bid {} x {} / ask {} x {}, removed {:?}",
                book.symbol(),
                bid.price,
                bid.qty,
                ask.price,
                ask.qty,
                corrected
            );
        }
        #[cfg(feature = "metrics")]
        crate::stats::metrics::count_correction();

        dirty.effect = UpdateEffect::Error;
        dirty.sides |= corrected;
        false
    }
}
