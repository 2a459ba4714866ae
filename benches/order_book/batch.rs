use criterion::{BenchmarkId, Criterion, Throughput};
use feedbook_rs::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

struct Sink;

impl Strategy for Sink {
    fn name(&self) -> &str {
        "sink"
    }

    fn on_order_book_update(&self, event: &BookUpdateEvent<'_>) -> Result<(), ListenerError> {
        black_box(event.book.best_bid());
        Ok(())
    }
}

fn symbols(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("SYM{i:04}")).collect()
}

fn connector(symbols: &[String]) -> MarketDataConnector {
    let mut mdc = MarketDataConnector::new(ConnectorConfig::new("bench")).unwrap();
    let strategy: Arc<dyn Strategy> = Arc::new(Sink);
    for symbol in symbols {
        mdc.add_instrument(Arc::new(Instrument::new(symbol, 0.01)))
            .unwrap();
        mdc.subscribe_mkt_data(Arc::clone(&strategy), symbol, UpdateEffect::L1Qty, false)
            .unwrap();
    }
    mdc
}

/// Register benchmarks for message processing and notification.
pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("Connector - Chunk");

    for &books in &[1usize, 16, 256] {
        let symbols = symbols(books);
        let mut msg = NormalizedMessage::with_capacity(books * 4);
        for symbol in &symbols {
            msg.push(symbol, 0, NormalizedUpdate::level(BookSide::Bid, Action::New, 99.99, 1.0))
                .push(symbol, 0, NormalizedUpdate::level(BookSide::Ask, Action::New, 100.01, 1.0))
                .push(symbol, 0, NormalizedUpdate::level(BookSide::Bid, Action::Change, 99.99, -1.0))
                .push(symbol, 0, NormalizedUpdate::level(BookSide::Ask, Action::Change, 100.01, -1.0));
        }

        group.throughput(Throughput::Elements(msg.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("process_and_notify", books),
            &msg,
            |b, msg| {
                let mut mdc = connector(&symbols);
                b.iter(|| {
                    let outcome = mdc.process_incremental(msg, RecvTimes::at(current_time_nanos()));
                    black_box(outcome);
                    black_box(mdc.end_of_chunk())
                });
            },
        );
    }

    group.finish();
}
