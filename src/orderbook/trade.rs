//! Trades reported by venues or inferred from order-log deltas.

use super::instrument::Instrument;
use super::registry::{OrderId, RequestId};
use super::types::BookSide;
use serde::Serialize;
use std::sync::Arc;

/// How a trade reached the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeOrigin {
    /// The venue sent an explicit trade entry.
    Explicit,
    /// Derived from a decrease of a resting order in an order-log feed.
    Inferred,
}

/// One execution.
///
/// Built on the stack for every trade event and handed to the order manager
/// and strategies by reference.
#[derive(Debug, Clone, Serialize)]
pub struct Trade {
    /// Traded instrument
    #[serde(serialize_with = "serialize_symbol")]
    pub instrument: Arc<Instrument>,
    /// Execution price
    pub price: f64,
    /// Executed quantity, always positive
    pub qty: f64,
    /// Side of the aggressor: `Bid` for a buyer lifting offers, `Ask` for a
    /// seller hitting bids. `None` when the venue does not say.
    pub aggressor: Option<BookSide>,
    /// Venue execution id, if any
    pub exec_id: Option<u64>,
    /// Resting order the trade executed against, if known
    pub order_id: Option<OrderId>,
    /// Settlement date (`YYYYMMDD`) for venues that report it
    pub settl_date: Option<u32>,
    /// Venue timestamp (nanoseconds)
    pub exchange_ts: u64,
    /// Local receipt timestamp (nanoseconds)
    pub receipt_ts: u64,
    /// Own request matched by this trade
    pub own_request: Option<RequestId>,
    /// Explicit or inferred
    pub origin: TradeOrigin,
}

impl Trade {
    /// True when the trade filled one of our own orders.
    #[must_use]
    #[inline]
    pub fn is_own(&self) -> bool {
        self.own_request.is_some()
    }

    /// Price times quantity.
    #[must_use]
    pub fn notional(&self) -> f64 {
        self.price * self.qty
    }
}

fn serialize_symbol<S>(instrument: &Arc<Instrument>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&instrument.symbol)
}
