//! Applies the entries of inbound messages to the books.
//!
//! Nothing is notified from here except trades: book effects are folded into
//! the dirty list and flushed by [`MarketDataConnector::end_of_chunk`].

use super::MarketDataConnector;
use super::dirty::RecvTimes;
use super::listener::OrderManager;
use super::subscription::Subscription;
use crate::feed::{FeedMessage, NormalizedUpdate};
use crate::orderbook::book::OrderBook;
use crate::orderbook::error::BookError;
use crate::orderbook::operations::OrderUpdateResult;
use crate::orderbook::trade::{Trade, TradeOrigin};
use crate::orderbook::types::{QTY_EPSILON, SeqNums, UpdateEffect, UpdatedSides};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Summary of one processed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Entries applied to a book
    pub applied: usize,
    /// Entries ignored: unknown instrument or already applied sequence
    pub skipped: usize,
    /// Entries rejected as malformed or inconsistent
    pub errors: usize,
    /// Trades delivered (explicit and inferred)
    pub trades: usize,
}

impl BatchOutcome {
    /// No entry was rejected.
    #[inline]
    pub fn ok(&self) -> bool {
        self.errors == 0
    }
}

impl MarketDataConnector {
    /// Applies every entry of `msg`.
    ///
    /// With `IS_SNAPSHOT` each book referenced by the message is cleared once,
    /// before its first entry, and entries are not sequence-gated against each
    /// other. Incremental entries that are not newer than the book are
    /// skipped; on non-multicast feeds with strict sequencing they are
    /// rejected as errors instead. Entries sharing the message's sequence
    /// number are all applied.
    pub fn process_message<const IS_SNAPSHOT: bool, M: FeedMessage>(
        &mut self,
        msg: &M,
        times: RecvTimes,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut cleared: Vec<usize> = Vec::new();
        let mut gate = SeqGate::default();
        let notify_trades = self.config.notify_trades && !self.dynamic_init;
        let order_manager = self.order_manager.as_ref();

        let mut guard = self.books.borrow_mut();
        let set = &mut *guard;

        for index in 0..msg.entry_count() {
            let Some(book_id) = set.resolve(msg.symbol_or_id(index)) else {
                trace!(
                    "{}: no book for {:?}",
                    self.config.name,
                    msg.symbol_or_id(index)
                );
                outcome.skipped += 1;
                continue;
            };
            let entry = msg.entry(index);
            let exchange_ts = msg.event_timestamp(index);
            let book = &mut set.books[book_id];
            let subscribers = set.subscribers[book_id].as_slice();

            let mut effect = UpdateEffect::None;
            let mut sides = UpdatedSides::empty();
            let mut touched = false;

            if IS_SNAPSHOT && !cleared.contains(&book_id) {
                cleared.push(book_id);
                fold_clear(book.clear(SeqNums::NONE), &mut effect, &mut sides);
                touched = true;
            }

            let stale = if IS_SNAPSHOT {
                None
            } else {
                gate.check(book_id, book, entry.seq)
            };

            if let Some(err) = stale {
                if self.config.is_multicast || !book.stale_effect(&err).is_error() {
                    trace!(
                        "{}: {} already applied rpt_seq {} seq_num {}",
                        self.config.name,
                        book.symbol(),
                        entry.seq.rpt_seq,
                        entry.seq.seq_num
                    );
                    outcome.skipped += 1;
                    continue;
                }
                outcome.errors += 1;
                effect = UpdateEffect::Error;
                touched = true;
            } else {
                match entry.side() {
                    Some(side) => {
                        touched = true;
                        let order_log = book.registry().is_some();
                        if let Err(err) = entry.validate(order_log) {
                            warn!("{}: {} entry skipped: {}", self.config.name, book.symbol(), err);
                            #[cfg(feature = "metrics")]
                            crate::stats::metrics::count_malformed();
                            outcome.errors += 1;
                            effect = UpdateEffect::Error;
                        } else {
                            // the feed sequence number was gated for the whole message
                            let seq = if IS_SNAPSHOT {
                                SeqNums::NONE
                            } else {
                                SeqNums::new(entry.seq.rpt_seq, 0)
                            };
                            let (entry_effect, entry_sides) = match entry.order_id {
                                Some(order_id) if order_log => {
                                    let result = book.apply_order_update(
                                        order_id,
                                        entry.action,
                                        side,
                                        entry.price,
                                        entry.qty,
                                        seq,
                                    );
                                    if let Some(trade) =
                                        infer_trade(book, entry, &result, exchange_ts, times)
                                    {
                                        outcome.trades += 1;
                                        route_trade(
                                            &self.config.name,
                                            &trade,
                                            subscribers,
                                            order_manager,
                                            notify_trades,
                                        );
                                    }
                                    (result.effect, result.sides)
                                }
                                _ => {
                                    let level_effect =
                                        book.update(side, entry.action, entry.price, entry.qty, seq);
                                    let level_sides = if level_effect == UpdateEffect::None {
                                        UpdatedSides::empty()
                                    } else {
                                        side.as_sides()
                                    };
                                    (level_effect, level_sides)
                                }
                            };
                            if entry_effect.is_error() {
                                outcome.errors += 1;
                            } else {
                                outcome.applied += 1;
                                book.record_sequence(entry.seq);
                            }
                            effect.accumulate(entry_effect);
                            sides |= entry_sides;
                        }
                    }
                    None if entry.is_trade() => match entry.validate(false) {
                        Ok(()) => {
                            book.record_sequence(entry.seq);
                            let trade = explicit_trade(book, entry, exchange_ts, times);
                            outcome.trades += 1;
                            route_trade(
                                &self.config.name,
                                &trade,
                                subscribers,
                                order_manager,
                                notify_trades,
                            );
                        }
                        Err(err) => {
                            warn!("{}: {} trade skipped: {}", self.config.name, book.symbol(), err);
                            #[cfg(feature = "metrics")]
                            crate::stats::metrics::count_malformed();
                            outcome.errors += 1;
                            effect = UpdateEffect::Error;
                            touched = true;
                        }
                    },
                    None => {
                        debug!("{}: {} empty-book marker", self.config.name, book.symbol());
                        fold_clear(book.clear(entry.seq), &mut effect, &mut sides);
                        outcome.applied += 1;
                        touched = true;
                    }
                }
            }

            if touched {
                let update_ts = (self.clock)();
                if let Err(err) =
                    self.dirty
                        .mark(book_id, effect, sides, exchange_ts, times, update_ts)
                {
                    error!(
                        "{}: {} update not queued for notification: {}",
                        self.config.name,
                        book.symbol(),
                        err
                    );
                }
            }
        }

        if IS_SNAPSHOT && self.config.is_multicast {
            for &book_id in &cleared {
                set.books[book_id].set_initialized(true);
            }
        }
        self.fragment_pending = !msg.is_last_fragment();

        #[cfg(feature = "metrics")]
        crate::stats::metrics::count_applied(outcome.applied as u64);
        trace!("{}: processed message {:?}", self.config.name, outcome);
        outcome
    }

    /// Applies a full-book snapshot message.
    pub fn process_snapshot<M: FeedMessage>(&mut self, msg: &M, times: RecvTimes) -> BatchOutcome {
        self.process_message::<true, M>(msg, times)
    }

    /// Applies an incremental message.
    pub fn process_incremental<M: FeedMessage>(
        &mut self,
        msg: &M,
        times: RecvTimes,
    ) -> BatchOutcome {
        self.process_message::<false, M>(msg, times)
    }
}

/// Sequence gate of one message.
///
/// Entries of a message may share its feed sequence number, so that number
/// is compared once per book against the value the book held before the
/// message. Report sequences are compared entry by entry.
#[derive(Default)]
struct SeqGate {
    baselines: Vec<(usize, u64)>,
}

impl SeqGate {
    fn check(&mut self, book_id: usize, book: &OrderBook, seq: SeqNums) -> Option<BookError> {
        let baseline = match self.baselines.iter().find(|(id, _)| *id == book_id) {
            Some(&(_, baseline)) => baseline,
            None => {
                self.baselines.push((book_id, book.last_seq_num()));
                book.last_seq_num()
            }
        };
        let stale = if seq.rpt_seq != 0 {
            seq.rpt_seq <= book.last_rpt_seq()
        } else {
            seq.seq_num != 0 && seq.seq_num <= baseline
        };
        stale.then(|| BookError::StaleSequence {
            rpt_seq: seq.rpt_seq,
            last_rpt_seq: book.last_rpt_seq(),
            seq_num: seq.seq_num,
            last_seq_num: baseline,
        })
    }
}

#[inline]
fn fold_clear(clear_effect: UpdateEffect, effect: &mut UpdateEffect, sides: &mut UpdatedSides) {
    if clear_effect != UpdateEffect::None {
        effect.accumulate(clear_effect);
        *sides |= UpdatedSides::BOTH;
    }
}

/// A decrease of a resting order flagged as traded is a fill of `-delta` at
/// the resting price, aggressed from the other side.
fn infer_trade(
    book: &OrderBook,
    entry: &NormalizedUpdate,
    result: &OrderUpdateResult,
    exchange_ts: u64,
    times: RecvTimes,
) -> Option<Trade> {
    if !entry.was_traded || result.effect.is_error() || result.qty_delta >= -QTY_EPSILON {
        return None;
    }
    let order = result.order?;
    let fields = entry.trade.unwrap_or_default();
    Some(Trade {
        instrument: Arc::clone(book.instrument()),
        price: order.price,
        qty: -result.qty_delta,
        aggressor: Some(order.side.opposite()),
        exec_id: fields.exec_id,
        order_id: Some(order.order_id),
        settl_date: fields.settl_date.or(book.instrument().settl_date),
        exchange_ts,
        receipt_ts: times.receipt_ts(),
        own_request: order.request,
        origin: TradeOrigin::Inferred,
    })
}

fn explicit_trade(
    book: &OrderBook,
    entry: &NormalizedUpdate,
    exchange_ts: u64,
    times: RecvTimes,
) -> Trade {
    let fields = entry.trade.unwrap_or_default();
    let own_request = entry
        .order_id
        .and_then(|order_id| book.registry().and_then(|r| r.own_request(order_id)));
    Trade {
        instrument: Arc::clone(book.instrument()),
        price: entry.price,
        qty: entry.qty,
        aggressor: fields.aggressor,
        exec_id: fields.exec_id,
        order_id: entry.order_id,
        settl_date: fields.settl_date.or(book.instrument().settl_date),
        exchange_ts,
        receipt_ts: times.receipt_ts(),
        own_request,
        origin: TradeOrigin::Explicit,
    }
}

/// Own fills reach the order manager before any strategy sees the trade.
fn route_trade(
    connector: &str,
    trade: &Trade,
    subscribers: &[Subscription],
    order_manager: Option<&Arc<dyn OrderManager>>,
    notify_strategies: bool,
) {
    if let Some(request) = trade.own_request {
        match order_manager {
            Some(manager) => {
                if let Err(err) = manager.process_trade(trade, request) {
                    error!(
                        "{}: order manager failed on fill of request {}: {}",
                        connector, request, err
                    );
                }
            }
            None => debug!(
                "{}: own fill of request {} without order manager",
                connector, request
            ),
        }
    }
    if !notify_strategies {
        return;
    }
    for subscription in subscribers {
        if let Err(err) = subscription.strategy.on_trade_update(trade) {
            error!(
                "{}: strategy {} failed on trade: {}",
                connector,
                subscription.strategy.name(),
                err
            );
        }
    }
}
