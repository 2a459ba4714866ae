//! Value types shared by the book engine: sides, actions, effects and levels.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantities below this magnitude are treated as zero when a level or an
/// order slot is reduced.
pub const QTY_EPSILON: f64 = 1e-9;

/// Side of the book an entry or an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookSide {
    /// Buy side, best level is the highest price.
    Bid,
    /// Sell side, best level is the lowest price.
    Ask,
}

impl BookSide {
    /// Returns the other side of the book.
    #[must_use]
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            BookSide::Bid => BookSide::Ask,
            BookSide::Ask => BookSide::Bid,
        }
    }

    /// The single-side flag for this side.
    #[must_use]
    #[inline]
    pub fn as_sides(self) -> UpdatedSides {
        match self {
            BookSide::Bid => UpdatedSides::BID,
            BookSide::Ask => UpdatedSides::ASK,
        }
    }
}

impl fmt::Display for BookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookSide::Bid => write!(f, "BID"),
            BookSide::Ask => write!(f, "ASK"),
        }
    }
}

/// What a normalized entry does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Add a level (aggregated feeds) or an order (order-log feeds).
    New,
    /// Modify an existing level or order.
    Change,
    /// Remove a level or an order.
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::New => write!(f, "New"),
            Action::Change => write!(f, "Change"),
            Action::Delete => write!(f, "Delete"),
        }
    }
}

/// Kind of a normalized market-data entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// A bid level or a bid order.
    Bid,
    /// An ask level or an ask order.
    Ask,
    /// An execution reported by the venue.
    Trade,
    /// Marker requesting the whole book to be cleared.
    EmptyBook,
}

impl EntryType {
    /// The book side for `Bid`/`Ask` entries.
    #[must_use]
    #[inline]
    pub fn side(self) -> Option<BookSide> {
        match self {
            EntryType::Bid => Some(BookSide::Bid),
            EntryType::Ask => Some(BookSide::Ask),
            EntryType::Trade | EntryType::EmptyBook => None,
        }
    }
}

/// How much of a book an update touched, ranked by severity.
///
/// Effects of several entries hitting the same book within one chunk are
/// combined with `max`, so the derived ordering is part of the contract:
/// `None < L1Qty < L1Px < L2 < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum UpdateEffect {
    /// Nothing observable changed.
    #[default]
    None,
    /// Only the best quantity changed.
    L1Qty,
    /// The best price changed.
    L1Px,
    /// A level below the top changed.
    L2,
    /// The update violated an invariant or was malformed.
    Error,
}

impl UpdateEffect {
    /// Folds `other` into `self` keeping the more severe effect.
    #[inline]
    pub fn accumulate(&mut self, other: UpdateEffect) {
        if other > *self {
            *self = other;
        }
    }

    /// True for `UpdateEffect::Error`.
    #[must_use]
    #[inline]
    pub fn is_error(self) -> bool {
        self == UpdateEffect::Error
    }
}

impl fmt::Display for UpdateEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateEffect::None => "None",
            UpdateEffect::L1Qty => "L1Qty",
            UpdateEffect::L1Px => "L1Px",
            UpdateEffect::L2 => "L2",
            UpdateEffect::Error => "Error",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Sides of a book touched by one or more updates.
    ///
    /// ```
    /// use feedbook_rs::UpdatedSides;
    ///
    /// let mut sides = UpdatedSides::empty();
    /// sides |= UpdatedSides::BID;
    /// assert!(sides.contains(UpdatedSides::BID));
    /// assert!(!sides.contains(UpdatedSides::ASK));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct UpdatedSides: u8 {
        /// The bid side changed.
        const BID = 1 << 0;
        /// The ask side changed.
        const ASK = 1 << 1;
        /// Both sides changed.
        const BOTH = Self::BID.bits() | Self::ASK.bits();
    }
}

/// Venue sequence counters carried by an entry. Zero means "not provided".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeqNums {
    /// Per-instrument report sequence (e.g. FIX `RptSeq`).
    pub rpt_seq: u64,
    /// Feed or message sequence number.
    pub seq_num: u64,
}

impl SeqNums {
    /// No sequence information.
    pub const NONE: SeqNums = SeqNums {
        rpt_seq: 0,
        seq_num: 0,
    };

    /// Creates sequence counters from a report sequence and a sequence number.
    #[must_use]
    pub const fn new(rpt_seq: u64, seq_num: u64) -> Self {
        Self { rpt_seq, seq_num }
    }

    /// True when neither counter is set.
    #[must_use]
    #[inline]
    pub fn is_none(&self) -> bool {
        self.rpt_seq == 0 && self.seq_num == 0
    }
}

/// One aggregated price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level price.
    pub price: f64,
    /// Aggregate quantity resting at `price`.
    pub qty: f64,
}

impl PriceLevel {
    /// Creates a level.
    #[must_use]
    pub const fn new(price: f64, qty: f64) -> Self {
        Self { price, qty }
    }
}
