//! Normalized feed contract between venue adapters and the book engine.

pub mod message;
pub mod update;

pub use message::{FeedMessage, InstrumentKey, NormalizedMessage};
pub use update::{NormalizedUpdate, SymbolKey, TradeFields};
