//! Per-instrument order book: aggregated levels, the optional order registry
//! and snapshots.

pub mod book;
pub mod config;
pub mod error;
pub mod instrument;
/// Per-order updates for order-log feeds.
pub mod operations;
pub mod registry;
/// Checksum-protected snapshots for recorders and replay.
pub mod snapshot;
/// Trades reported or inferred by the engine.
pub mod trade;
pub mod types;

pub use book::OrderBook;
pub use config::{BookConfig, DEFAULT_REGISTRY_CAPACITY};
pub use error::BookError;
pub use instrument::Instrument;
pub use operations::OrderUpdateResult;
pub use registry::{OrderId, OrderInfo, OrderRegistry, RequestId};
pub use snapshot::{BOOK_SNAPSHOT_FORMAT_VERSION, BookSnapshot, BookSnapshotPackage};
pub use trade::{Trade, TradeOrigin};
pub use types::{
    Action, BookSide, EntryType, PriceLevel, QTY_EPSILON, SeqNums, UpdateEffect, UpdatedSides,
};
