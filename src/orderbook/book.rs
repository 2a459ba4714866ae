//! Core OrderBook implementation: aggregated price levels per side plus an
//! optional per-order registry.

use super::config::BookConfig;
use super::error::BookError;
use super::instrument::Instrument;
use super::registry::OrderRegistry;
use super::types::{Action, BookSide, PriceLevel, QTY_EPSILON, SeqNums, UpdateEffect, UpdatedSides};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Aggregated order book for one instrument.
///
/// Bids are kept in descending price order, asks in ascending order, each in
/// a `Vec` bounded by [`BookConfig::max_depth`] (or unbounded when the depth
/// is `None`). Books fed by order-log venues additionally keep an
/// [`OrderRegistry`] so that updates and deletes can address single orders.
///
/// The book itself never notifies anybody: every mutating call returns an
/// [`UpdateEffect`] and the caller decides what to do with it.
#[derive(Debug)]
pub struct OrderBook {
    /// The instrument this book belongs to
    pub(super) instrument: Arc<Instrument>,

    /// Interpretation switches shared by every book of a connector
    pub(super) config: BookConfig,

    /// Bid levels, best (highest) first
    pub(super) bids: Vec<PriceLevel>,

    /// Ask levels, best (lowest) first
    pub(super) asks: Vec<PriceLevel>,

    /// Individual orders, present only for order-log feeds
    pub(super) registry: Option<OrderRegistry>,

    /// Last applied feed sequence number
    pub(super) last_seq_num: u64,

    /// Last applied report sequence
    pub(super) last_rpt_seq: u64,

    /// Top of book can be trusted
    pub(super) initialized: bool,

    /// Monotonic counter of mutations, used to order side updates
    pub(super) mutation_count: u64,

    /// Value of `mutation_count` when each side last changed
    pub(super) bid_touched_at: u64,
    pub(super) ask_touched_at: u64,
}

impl OrderBook {
    /// Create a new empty order book for `instrument`.
    pub fn new(instrument: Arc<Instrument>, config: BookConfig) -> Self {
        let registry = config
            .order_registry
            .then(|| OrderRegistry::new(config.registry_capacity));
        let reserve = config.max_depth.unwrap_or(64);

        Self {
            instrument,
            bids: Vec::with_capacity(reserve + 1),
            asks: Vec::with_capacity(reserve + 1),
            registry,
            config,
            last_seq_num: 0,
            last_rpt_seq: 0,
            initialized: false,
            mutation_count: 0,
            bid_touched_at: 0,
            ask_touched_at: 0,
        }
    }

    /// The instrument of this book.
    #[must_use]
    pub fn instrument(&self) -> &Arc<Instrument> {
        &self.instrument
    }

    /// Shortcut for the instrument symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.instrument.symbol
    }

    /// The configuration this book was created with.
    #[must_use]
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Bid levels, best first.
    #[must_use]
    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    /// Ask levels, best first.
    #[must_use]
    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    /// Levels of one side, best first.
    #[must_use]
    pub fn levels(&self, side: BookSide) -> &[PriceLevel] {
        match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        }
    }

    /// Best bid level, if any.
    #[must_use]
    #[inline]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    /// Best ask level, if any.
    #[must_use]
    #[inline]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    /// Aggregate quantity at `price` on `side`.
    #[must_use]
    pub fn qty_at(&self, side: BookSide, price: f64) -> Option<f64> {
        let levels = self.levels(side);
        Self::find(side, levels, price).ok().map(|i| levels[i].qty)
    }

    /// Average of best bid and best ask.
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        }
    }

    /// Best ask minus best bid.
    #[must_use]
    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// True when best bid ≥ best ask.
    #[must_use]
    #[inline]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid.price >= ask.price,
            _ => false,
        }
    }

    /// True when both sides are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Whether enough data has been applied to trust the top of book.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn set_initialized(&mut self, initialized: bool) {
        if initialized != self.initialized {
            debug!("{}: initialized = {}", self.symbol(), initialized);
        }
        self.initialized = initialized;
    }

    /// Last applied feed sequence number (0 if none).
    #[must_use]
    pub fn last_seq_num(&self) -> u64 {
        self.last_seq_num
    }

    /// Last applied report sequence (0 if none).
    #[must_use]
    pub fn last_rpt_seq(&self) -> u64 {
        self.last_rpt_seq
    }

    /// The per-order registry, for order-log books.
    #[must_use]
    pub fn registry(&self) -> Option<&OrderRegistry> {
        self.registry.as_ref()
    }

    pub(crate) fn registry_mut(&mut self) -> Option<&mut OrderRegistry> {
        self.registry.as_mut()
    }

    /// True when `seq` is not newer than what the book has already applied.
    ///
    /// A report sequence, when present, takes precedence over the feed
    /// sequence number, since several entries of one message can share the
    /// latter.
    #[must_use]
    pub fn is_stale(&self, seq: SeqNums) -> bool {
        if seq.rpt_seq != 0 {
            seq.rpt_seq <= self.last_rpt_seq
        } else {
            seq.seq_num != 0 && seq.seq_num <= self.last_seq_num
        }
    }

    pub(super) fn check_sequence(&self, seq: SeqNums) -> Result<(), BookError> {
        if self.is_stale(seq) {
            return Err(BookError::StaleSequence {
                rpt_seq: seq.rpt_seq,
                last_rpt_seq: self.last_rpt_seq,
                seq_num: seq.seq_num,
                last_seq_num: self.last_seq_num,
            });
        }
        Ok(())
    }

    pub(crate) fn record_sequence(&mut self, seq: SeqNums) {
        if seq.rpt_seq > self.last_rpt_seq {
            self.last_rpt_seq = seq.rpt_seq;
        }
        if seq.seq_num > self.last_seq_num {
            self.last_seq_num = seq.seq_num;
        }
    }

    /// Maps a stale sequence to the configured effect.
    pub(crate) fn stale_effect(&self, err: &BookError) -> UpdateEffect {
        if self.config.strict_sequencing {
            warn!("{}: {}", self.symbol(), err);
            UpdateEffect::Error
        } else {
            trace!("{}: ignoring {}", self.symbol(), err);
            UpdateEffect::None
        }
    }

    /// Apply one aggregated update.
    ///
    /// * `New` inserts `qty` at `price`; an existing level is summed with it,
    ///   or replaced by `max(old, qty)` in full-amount mode.
    /// * `Change` adds the (signed) delta `qty` to the level and removes the
    ///   level when the result is not positive.
    /// * `Delete` removes the level.
    ///
    /// Stale sequence numbers are rejected without touching the book. An
    /// `Error` effect guarantees the book is unchanged.
    pub fn update(
        &mut self,
        side: BookSide,
        action: Action,
        price: f64,
        qty: f64,
        seq: SeqNums,
    ) -> UpdateEffect {
        if let Err(err) = self.check_sequence(seq) {
            return self.stale_effect(&err);
        }
        match self.apply_level(side, action, price, qty) {
            Ok(effect) => {
                self.record_sequence(seq);
                trace!(
                    "{}: {} {} {} x {} -> {}",
                    self.symbol(),
                    action,
                    side,
                    price,
                    qty,
                    effect
                );
                effect
            }
            Err(err) => {
                warn!("{}: rejected {} {}: {}", self.symbol(), action, side, err);
                UpdateEffect::Error
            }
        }
    }

    /// Empty both sides (and the order registry).
    ///
    /// Returns `L1Px` when the book held anything, `None` otherwise. A clear
    /// is a new baseline, so the stored sequence counters are reset to `seq`.
    pub fn clear(&mut self, seq: SeqNums) -> UpdateEffect {
        let was_empty = self.is_empty();
        self.bids.clear();
        self.asks.clear();
        if let Some(registry) = self.registry.as_mut() {
            registry.clear();
        }
        self.last_rpt_seq = seq.rpt_seq;
        self.last_seq_num = seq.seq_num;
        self.touch(BookSide::Bid);
        self.touch(BookSide::Ask);

        if was_empty {
            UpdateEffect::None
        } else {
            UpdateEffect::L1Px
        }
    }

    /// Clear the book and mark it as not initialized (reconnect, stop).
    pub fn invalidate(&mut self) {
        self.clear(SeqNums::NONE);
        self.set_initialized(false);
    }

    /// Repair a crossed book.
    ///
    /// Removes top levels from whichever side was updated less recently until
    /// best bid < best ask again, dropping registry orders resting on the
    /// removed levels. Returns the sides that were modified.
    pub fn correct_book(&mut self) -> UpdatedSides {
        let mut touched = UpdatedSides::empty();
        loop {
            let (bid, ask) = match (self.best_bid(), self.best_ask()) {
                (Some(bid), Some(ask)) if bid.price >= ask.price => (bid, ask),
                _ => break,
            };
            let stale_side = if self.bid_touched_at <= self.ask_touched_at {
                BookSide::Bid
            } else {
                BookSide::Ask
            };
            let removed = match stale_side {
                BookSide::Bid => self.bids.remove(0),
                BookSide::Ask => self.asks.remove(0),
            };
            if let Some(registry) = self.registry.as_mut() {
                let purged = registry.purge(stale_side, |px| px == removed.price);
                trace!("{}: purged {} orders at {}", self.symbol(), purged, removed.price);
            }
            debug!(
                "{}: crossed bid {} / ask {}, dropped {} level {} x {}",
                self.symbol(),
                bid.price,
                ask.price,
                stale_side,
                removed.price,
                removed.qty
            );
            touched |= stale_side.as_sides();
        }
        touched
    }

    /// Position of `price` within `levels` (`Ok`) or where it would go (`Err`).
    #[inline]
    pub(super) fn find(side: BookSide, levels: &[PriceLevel], price: f64) -> Result<usize, usize> {
        match side {
            BookSide::Bid => levels.binary_search_by(|level| price.total_cmp(&level.price)),
            BookSide::Ask => levels.binary_search_by(|level| level.price.total_cmp(&price)),
        }
    }

    #[inline]
    fn side_mut(&mut self, side: BookSide) -> &mut Vec<PriceLevel> {
        match side {
            BookSide::Bid => &mut self.bids,
            BookSide::Ask => &mut self.asks,
        }
    }

    #[inline]
    fn touch(&mut self, side: BookSide) {
        self.mutation_count += 1;
        match side {
            BookSide::Bid => self.bid_touched_at = self.mutation_count,
            BookSide::Ask => self.ask_touched_at = self.mutation_count,
        }
    }

    fn validate_price(price: f64) -> Result<(), BookError> {
        if price.is_finite() {
            Ok(())
        } else {
            Err(BookError::malformed(format!("non-finite price {price}")))
        }
    }

    /// Applies an aggregated action without any sequence handling.
    pub(super) fn apply_level(
        &mut self,
        side: BookSide,
        action: Action,
        price: f64,
        qty: f64,
    ) -> Result<UpdateEffect, BookError> {
        Self::validate_price(price)?;
        match action {
            Action::New => {
                if !qty.is_finite() || qty <= 0.0 {
                    return Err(BookError::malformed(format!("invalid new quantity {qty}")));
                }
                let full_amount = self.config.full_amount;
                let levels = self.levels(side);
                match Self::find(side, levels, price) {
                    Ok(i) => {
                        let old = levels[i].qty;
                        let new = if full_amount { old.max(qty) } else { old + qty };
                        if new == old {
                            return Ok(UpdateEffect::None);
                        }
                        self.side_mut(side)[i].qty = new;
                        self.touch(side);
                        Ok(if i == 0 {
                            UpdateEffect::L1Qty
                        } else {
                            UpdateEffect::L2
                        })
                    }
                    Err(pos) => Ok(self.insert_level(side, pos, price, qty)),
                }
            }
            Action::Change => {
                if !qty.is_finite() {
                    return Err(BookError::malformed(format!("invalid change delta {qty}")));
                }
                self.adjust_level(side, price, qty, self.config.full_amount)
            }
            Action::Delete => {
                let levels = self.levels(side);
                match Self::find(side, levels, price) {
                    Ok(i) => Ok(self.remove_level(side, i)),
                    Err(_) => Ok(UpdateEffect::None),
                }
            }
        }
    }

    /// Adds a signed `delta` to the level at `price`.
    ///
    /// A missing level is created for a positive delta. A result at or below
    /// zero removes the level; a clearly negative result is an error when
    /// `reject_negative` is set, and is clamped otherwise.
    pub(super) fn adjust_level(
        &mut self,
        side: BookSide,
        price: f64,
        delta: f64,
        reject_negative: bool,
    ) -> Result<UpdateEffect, BookError> {
        Self::validate_price(price)?;
        let levels = self.levels(side);
        match Self::find(side, levels, price) {
            Ok(i) => {
                let resulting = levels[i].qty + delta;
                if resulting <= QTY_EPSILON {
                    if resulting < -QTY_EPSILON {
                        if reject_negative {
                            return Err(BookError::NegativeQuantity {
                                side,
                                price,
                                resulting,
                            });
                        }
                        debug!(
                            "{}: clamping {} level {} at {}",
                            self.symbol(),
                            side,
                            price,
                            resulting
                        );
                    }
                    return Ok(self.remove_level(side, i));
                }
                if delta == 0.0 {
                    return Ok(UpdateEffect::None);
                }
                self.side_mut(side)[i].qty = resulting;
                self.touch(side);
                Ok(if i == 0 {
                    UpdateEffect::L1Qty
                } else {
                    UpdateEffect::L2
                })
            }
            Err(pos) if delta > QTY_EPSILON => Ok(self.insert_level(side, pos, price, delta)),
            Err(_) => {
                if delta < -QTY_EPSILON {
                    trace!(
                        "{}: negative delta {} for missing {} level {}",
                        self.symbol(),
                        delta,
                        side,
                        price
                    );
                }
                Ok(UpdateEffect::None)
            }
        }
    }

    fn insert_level(&mut self, side: BookSide, pos: usize, price: f64, qty: f64) -> UpdateEffect {
        if let Some(depth) = self.config.max_depth {
            if pos >= depth {
                trace!(
                    "{}: {} level {} beyond depth {}",
                    self.symbol(),
                    side,
                    price,
                    depth
                );
                return UpdateEffect::None;
            }
        }
        let max_depth = self.config.max_depth;
        let levels = self.side_mut(side);
        levels.insert(pos, PriceLevel::new(price, qty));
        if let Some(depth) = max_depth {
            levels.truncate(depth);
        }
        self.touch(side);
        if pos == 0 {
            UpdateEffect::L1Px
        } else {
            UpdateEffect::L2
        }
    }

    fn remove_level(&mut self, side: BookSide, index: usize) -> UpdateEffect {
        self.side_mut(side).remove(index);
        self.touch(side);
        if index == 0 {
            UpdateEffect::L1Px
        } else {
            UpdateEffect::L2
        }
    }
}
