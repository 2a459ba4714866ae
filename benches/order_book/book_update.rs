use criterion::{BenchmarkId, Criterion};
use feedbook_rs::{Action, BookConfig, BookSide, Instrument, OrderBook, SeqNums};
use std::hint::black_box;
use std::sync::Arc;

fn book(config: BookConfig) -> OrderBook {
    OrderBook::new(Arc::new(Instrument::new("BENCH", 0.01)), config)
}

/// Register benchmarks for single-book updates.
pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("OrderBook - Update");

    for &depth in &[5usize, 20, 100] {
        group.bench_with_input(
            BenchmarkId::new("aggregated_top_churn", depth),
            &depth,
            |b, &depth| {
                let mut book = book(BookConfig::aggregated(depth));
                for i in 0..depth {
                    book.update(BookSide::Bid, Action::New, 100.0 - i as f64 * 0.01, 5.0, SeqNums::NONE);
                    book.update(BookSide::Ask, Action::New, 100.01 + i as f64 * 0.01, 5.0, SeqNums::NONE);
                }
                let mut flip = false;
                b.iter(|| {
                    flip = !flip;
                    let delta = if flip { 1.0 } else { -1.0 };
                    black_box(book.update(BookSide::Bid, Action::Change, 100.0, delta, SeqNums::NONE))
                });
            },
        );
    }

    group.bench_function("aggregated_insert_delete_mid_depth", |b| {
        let mut book = book(BookConfig::aggregated(20));
        for i in 0..20 {
            book.update(BookSide::Ask, Action::New, 100.0 + i as f64 * 0.02, 5.0, SeqNums::NONE);
        }
        b.iter(|| {
            book.update(BookSide::Ask, Action::New, 100.11, 1.0, SeqNums::NONE);
            black_box(book.update(BookSide::Ask, Action::Delete, 100.11, 0.0, SeqNums::NONE))
        });
    });

    for &orders in &[100u64, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("order_log_new_fill_delete", orders),
            &orders,
            |b, &orders| {
                let mut book = book(BookConfig::order_log(orders as usize + 1));
                for id in 0..orders {
                    let side = if id % 2 == 0 { BookSide::Bid } else { BookSide::Ask };
                    let price = match side {
                        BookSide::Bid => 99.0 - (id % 50) as f64 * 0.01,
                        BookSide::Ask => 101.0 + (id % 50) as f64 * 0.01,
                    };
                    book.apply_order_update(id, Action::New, side, price, 10.0, SeqNums::NONE);
                }
                let probe = orders;
                b.iter(|| {
                    book.apply_order_update(probe, Action::New, BookSide::Bid, 99.5, 10.0, SeqNums::NONE);
                    book.apply_order_update(probe, Action::Change, BookSide::Bid, f64::NAN, 4.0, SeqNums::NONE);
                    black_box(book.apply_order_update(
                        probe,
                        Action::Delete,
                        BookSide::Bid,
                        f64::NAN,
                        0.0,
                        SeqNums::NONE,
                    ))
                });
            },
        );
    }

    group.finish();
}
