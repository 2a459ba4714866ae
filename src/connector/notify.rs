//! Flushes the dirty list to risk and strategies.

use super::MarketDataConnector;
use super::listener::BookUpdateEvent;
use super::verify::ConsistencyVerifier;
use crate::orderbook::types::UpdateEffect;
use tracing::{error, trace};

impl MarketDataConnector {
    /// Ends the current chunk.
    ///
    /// Notification is deferred while the last processed message was not
    /// the last fragment of a logical message. Returns `false` when a book
    /// had to be repaired.
    pub fn end_of_chunk(&mut self) -> bool {
        if self.fragment_pending {
            trace!(
                "{}: fragment pending, {} dirty books kept",
                self.config.name,
                self.dirty.len()
            );
            return true;
        }
        self.notify_order_book_updates()
    }

    /// Verifies every dirty book and notifies its subscribers.
    ///
    /// Books are handled in first-dirtied order. Per book, the risk manager
    /// sees top-of-book price changes before any strategy. Strategies are
    /// walked in ascending threshold order and the walk stops at the first
    /// threshold above the accumulated effect. Books not yet initialized,
    /// books without effect and everything during Dynamic-Init are only
    /// verified. The dirty list is empty afterwards.
    ///
    /// Returns `false` when any book failed verification.
    pub fn notify_order_book_updates(&mut self) -> bool {
        let verifier = ConsistencyVerifier::from_config(&self.config);
        let mut all_ok = true;
        let mut guard = self.books.borrow_mut();
        let set = &mut *guard;

        for dirty in self.dirty.iter_mut() {
            let book = &mut set.books[dirty.book];
            all_ok &= verifier.verify(book, dirty);

            if dirty.effect == UpdateEffect::L1Px && set.risk_registered[dirty.book] {
                if let Some(risk) = &self.risk_manager {
                    risk.on_market_data_update(book, dirty.update_ts);
                }
            }

            if !book.is_initialized() || dirty.effect == UpdateEffect::None || self.dynamic_init {
                continue;
            }

            let book = &*book;
            for subscription in &set.subscribers[dirty.book] {
                if subscription.min_level > dirty.effect {
                    break;
                }
                let strategy_ts = (self.clock)();
                self.stats.record_pipeline(&dirty.pipeline(strategy_ts));
                let event = BookUpdateEvent {
                    book,
                    is_error: dirty.effect.is_error(),
                    sides: dirty.sides,
                    exchange_ts: dirty.exchange_ts,
                    receipt_ts: dirty.recv.receipt_ts(),
                    strategy_ts,
                };
                if let Err(err) = subscription.strategy.on_order_book_update(&event) {
                    error!(
                        "{}: strategy {} failed on {} update: {}",
                        self.config.name,
                        subscription.strategy.name(),
                        book.symbol(),
                        err
                    );
                }
            }
        }

        self.dirty.clear();
        all_ok
    }
}
