//! Property-based tests for book invariants.

use feedbook_rs::{
    Action, BookConfig, BookSide, ConnectorConfig, Instrument, NormalizedMessage,
    NormalizedUpdate, OrderBook, RecvTimes, SeqNums, UpdateEffect,
};
use proptest::prelude::*;
use std::sync::Arc;

fn arb_side() -> impl Strategy<Value = BookSide> {
    prop_oneof![Just(BookSide::Bid), Just(BookSide::Ask)]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::New), Just(Action::Change), Just(Action::Delete)]
}

/// Prices on a half-tick grid around 100, so equality is exact.
fn arb_price() -> impl Strategy<Value = f64> {
    (0u32..40).prop_map(|tick| 90.0 + f64::from(tick) * 0.5)
}

fn arb_qty() -> impl Strategy<Value = f64> {
    (1u32..50).prop_map(f64::from)
}

/// Aggregated level update: side, action, price, quantity or delta.
fn arb_level_update() -> impl Strategy<Value = (BookSide, Action, f64, f64)> {
    (arb_side(), arb_action(), arb_price(), arb_qty(), any::<bool>()).prop_map(
        |(side, action, price, qty, shrink)| {
            let qty = if action == Action::Change && shrink { -qty } else { qty };
            (side, action, price, qty)
        },
    )
}

fn new_book(config: BookConfig) -> OrderBook {
    OrderBook::new(Arc::new(Instrument::new("PROP", 0.5)), config)
}

fn state(book: &OrderBook) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let pairs = |side| {
        book.levels(side)
            .iter()
            .map(|level| (level.price, level.qty))
            .collect::<Vec<_>>()
    };
    (pairs(BookSide::Bid), pairs(BookSide::Ask))
}

#[cfg(test)]
mod idempotence {
    use super::*;

    proptest! {
        #[test]
        fn prop_duplicate_sequence_is_ignored(
            updates in prop::collection::vec(arb_level_update(), 1..40),
            pick in any::<prop::sample::Index>(),
        ) {
            let mut book = new_book(BookConfig::aggregated(10));
            for (n, &(side, action, price, qty)) in updates.iter().enumerate() {
                book.update(side, action, price, qty, SeqNums::new(n as u64 + 1, 0));
            }

            let n = pick.index(updates.len());
            let (side, action, price, qty) = updates[n];
            let before = state(&book);
            let effect = book.update(side, action, price, qty, SeqNums::new(n as u64 + 1, 0));

            prop_assert_eq!(effect, UpdateEffect::None);
            prop_assert_eq!(state(&book), before);
        }

        #[test]
        fn prop_levels_stay_sorted_and_bounded(
            updates in prop::collection::vec(arb_level_update(), 1..80),
        ) {
            let mut book = new_book(BookConfig::aggregated(5));
            for &(side, action, price, qty) in &updates {
                book.update(side, action, price, qty, SeqNums::NONE);
            }

            let (bids, asks) = state(&book);
            prop_assert!(bids.len() <= 5 && asks.len() <= 5);
            prop_assert!(bids.windows(2).all(|w| w[0].0 > w[1].0));
            prop_assert!(asks.windows(2).all(|w| w[0].0 < w[1].0));
            prop_assert!(bids.iter().chain(&asks).all(|&(_, qty)| qty > 0.0));
        }
    }
}

#[cfg(test)]
mod no_crossing {
    use super::*;

    proptest! {
        #[test]
        fn prop_verified_books_are_not_crossed(
            chunks in prop::collection::vec(
                prop::collection::vec(arb_level_update(), 1..10),
                1..10,
            ),
        ) {
            let mut mdc = feedbook_rs::MarketDataConnector::new(ConnectorConfig::new("prop")).unwrap();
            mdc.add_instrument(Arc::new(Instrument::new("PROP", 0.5))).unwrap();

            for chunk in &chunks {
                let mut msg = NormalizedMessage::new();
                for &(side, action, price, qty) in chunk {
                    msg.push("PROP", 0, NormalizedUpdate::level(side, action, price, qty));
                }
                mdc.process_incremental(&msg, RecvTimes::default());
                mdc.end_of_chunk();

                let crossed = mdc.with_book("PROP", |book| {
                    match (book.best_bid(), book.best_ask()) {
                        (Some(bid), Some(ask)) => bid.price >= ask.price,
                        _ => false,
                    }
                });
                prop_assert_eq!(crossed, Some(false));
            }
        }
    }
}

#[cfg(test)]
mod order_log {
    use super::*;

    /// Order-log operation on a small id space: id, action, new quantity.
    fn arb_order_op() -> impl Strategy<Value = (u64, Action, f64)> {
        (1u64..8, arb_action(), (0u32..20).prop_map(f64::from))
    }

    proptest! {
        #[test]
        fn prop_level_equals_sum_of_live_orders(
            ops in prop::collection::vec(arb_order_op(), 1..100),
        ) {
            let price = 100.0;
            let mut book = new_book(BookConfig::order_log(64));

            for &(order_id, action, qty) in &ops {
                book.apply_order_update(order_id, action, BookSide::Bid, price, qty, SeqNums::NONE);

                let registry = book.registry().unwrap();
                let live: f64 = registry.iter().map(|order| order.qty).sum();
                let level = book.qty_at(BookSide::Bid, price).unwrap_or(0.0);
                prop_assert!((level - live).abs() < 1e-9, "level {} != live {}", level, live);
                prop_assert!(registry.iter().all(|order| order.qty > 0.0));
            }
        }

        #[test]
        fn prop_partial_fill_keeps_price(
            initial in 2u32..100,
            fills in prop::collection::vec(1u32..100, 1..10),
            echoed in arb_price(),
        ) {
            let mut book = new_book(BookConfig::order_log(8));
            book.apply_order_update(1, Action::New, BookSide::Ask, 100.0, f64::from(initial), SeqNums::NONE);

            let mut remaining = f64::from(initial);
            for fill in fills {
                remaining = (remaining - f64::from(fill)).max(1.0);
                book.apply_order_update(1, Action::Change, BookSide::Ask, echoed, remaining, SeqNums::NONE);
                let order = book.registry().unwrap().get(1).copied().unwrap();
                prop_assert_eq!(order.price, 100.0);
                prop_assert_eq!(order.qty, remaining);
            }
        }
    }
}
