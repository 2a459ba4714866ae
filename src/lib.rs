//! # Low-Latency Market-Data Order Book Engine
//!
//! `feedbook-rs` maintains per-instrument order books from venue market-data
//! feeds and notifies trading strategies when the books change. Venue
//! adapters (FIX, WebSocket/JSON, HTTP/2 push) decode their wire format into
//! a uniform sequence of [`NormalizedUpdate`] entries; the engine applies
//! them with strict sequencing and consistency guarantees and fans the
//! result out to subscribers with measured latency.
//!
//! ## Key Features
//!
//! - **Aggregated and order-log books**: price-level books bounded to a
//!   configured depth, or unbounded books backed by a fixed-capacity
//!   [`OrderRegistry`] that tracks individual orders by id.
//!
//! - **Update effects**: every mutation reports how much of the book it
//!   touched ([`UpdateEffect`]: `None < L1Qty < L1Px < L2 < Error`), so
//!   subscribers only wake up for the granularity they care about.
//!
//! - **Batching per chunk**: effects of all messages read in one I/O chunk
//!   accumulate per book and are flushed once, after a consistency pass that
//!   repairs crossed books.
//!
//! - **Trade routing**: explicit trades and trades inferred from order-log
//!   decreases are delivered to the order manager first when they fill an
//!   own order, then to strategies.
//!
//! - **Latency statistics**: five pipeline stages measured on every notified
//!   update, stored in running statistics, HDR histograms or exported
//!   through the `metrics` facade (feature `metrics`).
//!
//! - **Snapshots**: checksum-protected JSON snapshots of book levels for
//!   recorders and replay.
//!
//! ## Pipeline
//!
//! ```text
//! transport bytes
//!   -> venue adapter            (NormalizedUpdate entries in a FeedMessage)
//!   -> process_message          (apply entries, accumulate dirty books)
//!   -> end_of_chunk             (deferred while a fragment is pending)
//!       -> ConsistencyVerifier  (initialize, repair crossing)
//!       -> RiskManager          (top-of-book price changes)
//!       -> Strategy callbacks   (ascending threshold order)
//!       -> LatencyStats
//! ```
//!
//! ## Threading
//!
//! A [`MarketDataConnector`] and its books are driven from one thread and
//! use no locks. A secondary connector created with
//! [`MarketDataConnector::secondary`] shares the primary's books and must run
//! on the same thread; only the primary clears them.
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use feedbook_rs::prelude::*;
//!
//! #[derive(Default)]
//! struct TopOfBook {
//!     seen: Mutex<Vec<(Option<f64>, Option<f64>)>>,
//! }
//!
//! impl Strategy for TopOfBook {
//!     fn name(&self) -> &str {
//!         "top-of-book"
//!     }
//!
//!     fn on_order_book_update(&self, event: &BookUpdateEvent<'_>) -> Result<(), ListenerError> {
//!         let bid = event.book.best_bid().map(|level| level.price);
//!         let ask = event.book.best_ask().map(|level| level.price);
//!         self.seen
//!             .lock()
//!             .map_err(|_| ListenerError::Failed("poisoned".into()))?
//!             .push((bid, ask));
//!         Ok(())
//!     }
//! }
//!
//! let mut mdc = MarketDataConnector::new(ConnectorConfig::new("example")).unwrap();
//! mdc.add_instrument(Arc::new(Instrument::new("ETHUSDT", 0.01))).unwrap();
//!
//! let strategy = Arc::new(TopOfBook::default());
//! mdc.subscribe_mkt_data(strategy.clone(), "ETHUSDT", UpdateEffect::L1Px, false)
//!     .unwrap();
//!
//! let mut msg = NormalizedMessage::new();
//! msg.push("ETHUSDT", 0, NormalizedUpdate::level(BookSide::Bid, Action::New, 2000.0, 1.5));
//! msg.push("ETHUSDT", 0, NormalizedUpdate::level(BookSide::Ask, Action::New, 2000.5, 3.0));
//! mdc.process_incremental(&msg, RecvTimes::default());
//! mdc.end_of_chunk();
//!
//! let seen = strategy.seen.lock().unwrap();
//! assert_eq!(seen.as_slice(), &[(Some(2000.0), Some(2000.5))]);
//! ```
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]: `trace!` on the hot path, `debug!`
//! for tolerated anomalies, `warn!` for protocol violations and crossed
//! books, `error!` for capacity problems and failing callbacks. It never
//! installs a subscriber.

pub mod connector;
pub mod feed;
pub mod orderbook;
pub mod stats;

pub mod prelude;
mod utils;

pub use connector::{
    BatchOutcome, BookUpdateEvent, ConnectorConfig, ConsistencyVerifier, ListenerError,
    MarketDataConnector, OrderManager, RecvTimes, RiskManager, Strategy, TradingEvent,
};
pub use feed::{FeedMessage, NormalizedMessage, NormalizedUpdate, SymbolKey, TradeFields};
pub use orderbook::{
    Action, BookConfig, BookError, BookSide, BookSnapshot, BookSnapshotPackage, EntryType,
    Instrument, OrderBook, OrderId, OrderInfo, OrderRegistry, OrderUpdateResult, PriceLevel,
    RequestId, SeqNums, Trade, TradeOrigin, UpdateEffect, UpdatedSides,
};
pub use stats::{LatencyReport, LatencySinkKind, LatencyStage, LatencyStats};
pub use utils::current_time_nanos;
