//! Strategy subscriptions to books.

use super::MarketDataConnector;
use super::listener::Strategy;
use crate::feed::SymbolKey;
use crate::orderbook::error::BookError;
use crate::orderbook::types::UpdateEffect;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// A strategy notified for a book when the accumulated effect reaches
/// `min_level`.
#[derive(Clone)]
pub struct Subscription {
    /// The subscribed strategy
    pub strategy: Arc<dyn Strategy>,
    /// Notification threshold
    pub min_level: UpdateEffect,
}

impl Subscription {
    /// True when `strategy` is this subscription's strategy.
    #[inline]
    pub fn is(&self, strategy: &Arc<dyn Strategy>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.strategy), Arc::as_ptr(strategy))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("strategy", &self.strategy.name())
            .field("min_level", &self.min_level)
            .finish()
    }
}

/// Inserts `subscription` keeping the list ascending by threshold; equal
/// thresholds keep subscription order. An existing subscription of the same
/// strategy is replaced.
pub(super) fn insert_sorted(list: &mut Vec<Subscription>, subscription: Subscription) {
    list.retain(|existing| !existing.is(&subscription.strategy));
    let pos = list.partition_point(|existing| existing.min_level <= subscription.min_level);
    list.insert(pos, subscription);
}

impl MarketDataConnector {
    /// Subscribes `strategy` to the book of `symbol`.
    ///
    /// The strategy is notified whenever the accumulated effect of a chunk is
    /// at least `min_level`. With `register_risk` the risk manager receives
    /// top-of-book price changes of this book.
    ///
    /// # Errors
    /// [`BookError::UnknownInstrument`] if no book exists for `symbol`.
    pub fn subscribe_mkt_data(
        &mut self,
        strategy: Arc<dyn Strategy>,
        symbol: &str,
        min_level: UpdateEffect,
        register_risk: bool,
    ) -> Result<(), BookError> {
        let mut guard = self.books.borrow_mut();
        let set = &mut *guard;
        let index = set
            .resolve(SymbolKey::Symbol(symbol))
            .ok_or_else(|| BookError::UnknownInstrument(symbol.to_string()))?;

        info!(
            "{}: {} subscribed to {} at {}",
            self.config.name,
            strategy.name(),
            symbol,
            min_level
        );
        insert_sorted(
            &mut set.subscribers[index],
            Subscription {
                strategy,
                min_level,
            },
        );
        if register_risk {
            set.risk_registered[index] = true;
        }
        Ok(())
    }

    /// Removes every subscription of `strategy`. Returns how many were
    /// removed. Books left without subscribers stop feeding the risk
    /// manager.
    pub fn unsubscribe(&mut self, strategy: &Arc<dyn Strategy>) -> usize {
        let mut guard = self.books.borrow_mut();
        let set = &mut *guard;
        let mut removed = 0;
        for (list, risk) in set.subscribers.iter_mut().zip(&mut set.risk_registered) {
            let before = list.len();
            list.retain(|subscription| !subscription.is(strategy));
            removed += before - list.len();
            if list.is_empty() {
                *risk = false;
            }
        }
        debug!(
            "{}: {} unsubscribed from {} books",
            self.config.name,
            strategy.name(),
            removed
        );
        removed
    }

    /// Removes every subscription of every book.
    pub fn unsubscribe_all(&mut self) {
        let mut set = self.books.borrow_mut();
        for list in &mut set.subscribers {
            list.clear();
        }
        set.risk_registered.fill(false);
        info!("{}: all subscriptions removed", self.config.name);
    }

    /// Thresholds of the subscribers of `symbol`, in notification order.
    pub fn subscription_levels(&self, symbol: &str) -> Vec<UpdateEffect> {
        let set = self.books.borrow();
        set.resolve(SymbolKey::Symbol(symbol))
            .map(|index| {
                set.subscribers(index)
                    .iter()
                    .map(|subscription| subscription.min_level)
                    .collect()
            })
            .unwrap_or_default()
    }
}
