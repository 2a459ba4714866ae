//! The venue-agnostic entry produced by feed adapters.

use crate::orderbook::error::BookError;
use crate::orderbook::registry::OrderId;
use crate::orderbook::types::{Action, BookSide, EntryType, SeqNums};

/// Trade-specific fields of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TradeFields {
    /// Venue execution id
    pub exec_id: Option<u64>,
    /// Side of the aggressor
    pub aggressor: Option<BookSide>,
    /// Settlement date (`YYYYMMDD`)
    pub settl_date: Option<u32>,
}

/// How an entry names its instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKey<'a> {
    /// Venue symbol or alternate symbol
    Symbol(&'a str),
    /// Numeric security id
    SecurityId(u64),
}

/// One normalized market-data entry.
///
/// For aggregated feeds `qty` of a `Change` is the signed delta to apply to
/// the level; for order-log feeds it is the new remaining quantity of the
/// order. A NaN `price` means the venue did not send one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedUpdate {
    /// Bid, Ask, Trade or EmptyBook
    pub entry_type: EntryType,
    /// New, Change or Delete
    pub action: Action,
    /// Price, NaN when absent
    pub price: f64,
    /// Quantity (see type-level docs)
    pub qty: f64,
    /// Order id for order-log feeds
    pub order_id: Option<OrderId>,
    /// Sequence counters carried by the entry
    pub seq: SeqNums,
    /// The quantity decrease of this order-log entry is a fill
    pub was_traded: bool,
    /// Present on trade entries
    pub trade: Option<TradeFields>,
}

impl NormalizedUpdate {
    fn base(entry_type: EntryType, action: Action, price: f64, qty: f64) -> Self {
        Self {
            entry_type,
            action,
            price,
            qty,
            order_id: None,
            seq: SeqNums::NONE,
            was_traded: false,
            trade: None,
        }
    }

    /// An aggregated level entry.
    pub fn level(side: BookSide, action: Action, price: f64, qty: f64) -> Self {
        let entry_type = match side {
            BookSide::Bid => EntryType::Bid,
            BookSide::Ask => EntryType::Ask,
        };
        Self::base(entry_type, action, price, qty)
    }

    /// An order-log entry addressing `order_id`.
    pub fn order(side: BookSide, action: Action, order_id: OrderId, price: f64, qty: f64) -> Self {
        Self {
            order_id: Some(order_id),
            ..Self::level(side, action, price, qty)
        }
    }

    /// An explicit trade.
    pub fn trade(price: f64, qty: f64, fields: TradeFields) -> Self {
        Self {
            trade: Some(fields),
            ..Self::base(EntryType::Trade, Action::New, price, qty)
        }
    }

    /// A marker clearing the whole book.
    pub fn empty_book() -> Self {
        Self::base(EntryType::EmptyBook, Action::Delete, f64::NAN, 0.0)
    }

    /// Sets the sequence counters.
    #[must_use]
    pub fn with_seq(mut self, rpt_seq: u64, seq_num: u64) -> Self {
        self.seq = SeqNums::new(rpt_seq, seq_num);
        self
    }

    /// Flags the entry as the result of an execution.
    #[must_use]
    pub fn with_was_traded(mut self, was_traded: bool) -> Self {
        self.was_traded = was_traded;
        self
    }

    /// Links the entry to an order id.
    #[must_use]
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Book side for `Bid`/`Ask` entries.
    #[inline]
    pub fn side(&self) -> Option<BookSide> {
        self.entry_type.side()
    }

    /// True for explicit trade entries.
    #[inline]
    pub fn is_trade(&self) -> bool {
        self.entry_type == EntryType::Trade
    }

    /// True if the venue sent a price.
    #[inline]
    pub fn has_price(&self) -> bool {
        !self.price.is_nan()
    }

    /// Checks that the entry can be applied to a book of the given kind.
    ///
    /// # Errors
    /// [`BookError::MalformedEntry`] describing the first problem found.
    pub fn validate(&self, order_log: bool) -> Result<(), BookError> {
        match self.entry_type {
            EntryType::EmptyBook => Ok(()),
            EntryType::Trade => {
                if self.action != Action::New {
                    return Err(BookError::malformed(format!(
                        "trade entry with action {}",
                        self.action
                    )));
                }
                if !self.price.is_finite() || !self.qty.is_finite() || self.qty <= 0.0 {
                    return Err(BookError::malformed(format!(
                        "trade {} x {}",
                        self.price, self.qty
                    )));
                }
                Ok(())
            }
            EntryType::Bid | EntryType::Ask => {
                if order_log && self.order_id.is_none() {
                    return Err(BookError::malformed(format!(
                        "{} without order id on an order-log book",
                        self.action
                    )));
                }
                let price_required = !order_log || self.action == Action::New;
                if price_required && !self.price.is_finite() {
                    return Err(BookError::malformed(format!(
                        "{} {} with price {}",
                        self.entry_type_name(),
                        self.action,
                        self.price
                    )));
                }
                if self.has_price() && !self.price.is_finite() {
                    return Err(BookError::malformed(format!("infinite price {}", self.price)));
                }
                match self.action {
                    Action::New if !self.qty.is_finite() || self.qty <= 0.0 => Err(
                        BookError::malformed(format!("new with quantity {}", self.qty)),
                    ),
                    Action::Change if !self.qty.is_finite() => Err(BookError::malformed(
                        format!("change with quantity {}", self.qty),
                    )),
                    _ => Ok(()),
                }
            }
        }
    }

    fn entry_type_name(&self) -> &'static str {
        match self.entry_type {
            EntryType::Bid => "bid",
            EntryType::Ask => "ask",
            EntryType::Trade => "trade",
            EntryType::EmptyBook => "empty-book",
        }
    }
}
