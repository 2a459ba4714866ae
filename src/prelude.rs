//! Prelude module that re-exports commonly used types and traits.
//!
//! ```rust
//! use feedbook_rs::prelude::*;
//! ```

// Book engine
pub use crate::orderbook::{
    Action, BookConfig, BookError, BookSide, BookSnapshot, BookSnapshotPackage, EntryType,
    Instrument, OrderBook, OrderId, OrderInfo, OrderUpdateResult, PriceLevel, RequestId, SeqNums,
    Trade, TradeOrigin, UpdateEffect, UpdatedSides,
};

// Feed contract
pub use crate::feed::{FeedMessage, NormalizedMessage, NormalizedUpdate, SymbolKey, TradeFields};

// Connector and collaborators
pub use crate::connector::{
    BatchOutcome, BookUpdateEvent, ConnectorConfig, ListenerError, MarketDataConnector,
    OrderManager, RecvTimes, RiskManager, Strategy, TradingEvent,
};

// Latency statistics
pub use crate::stats::{LatencySinkKind, LatencyStage, LatencyStats, StatsSink, StatsSummary};

// Utility functions
pub use crate::utils::current_time_nanos;
