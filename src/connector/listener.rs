//! Collaborators notified by a connector.

use crate::orderbook::book::OrderBook;
use crate::orderbook::registry::RequestId;
use crate::orderbook::trade::Trade;
use crate::orderbook::types::UpdatedSides;
use thiserror::Error;

/// Error returned by a strategy or order-management callback.
///
/// The connector logs it and carries on with the remaining subscribers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ListenerError {
    /// The callback refused the event.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The callback failed while handling the event.
    #[error("failed: {0}")]
    Failed(String),
}

/// Order book update delivered to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct BookUpdateEvent<'a> {
    /// The updated book, already verified
    pub book: &'a OrderBook,
    /// The update (or the verification) produced an error; the book content
    /// may have been repaired
    pub is_error: bool,
    /// Sides that changed since the previous notification
    pub sides: UpdatedSides,
    /// Venue timestamp of the latest entry (ns)
    pub exchange_ts: u64,
    /// Local receipt timestamp (ns)
    pub receipt_ts: u64,
    /// Time the strategy was called (ns)
    pub strategy_ts: u64,
}

/// Connector life-cycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingEvent {
    /// Every book was cleared and must be rebuilt before use.
    MarketDataReset,
    /// The connector stopped; no further updates will arrive.
    Stopped,
}

/// A market-data consumer.
pub trait Strategy: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// A subscribed book changed at least as much as the subscription
    /// threshold.
    fn on_order_book_update(&self, event: &BookUpdateEvent<'_>) -> Result<(), ListenerError>;

    /// A trade on a subscribed instrument.
    fn on_trade_update(&self, _trade: &Trade) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A connector life-cycle event.
    fn on_trading_event(&self, _event: TradingEvent) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// Risk valuation fed from top-of-book price changes.
pub trait RiskManager: Send + Sync {
    /// Best price of `book` changed; `timestamp` is the book update time.
    fn on_market_data_update(&self, book: &OrderBook, timestamp: u64);
}

/// Order-management layer that owns own-order requests.
pub trait OrderManager: Send + Sync {
    /// A trade filled (part of) the own request `request`.
    fn process_trade(&self, trade: &Trade, request: RequestId) -> Result<(), ListenerError>;
}
