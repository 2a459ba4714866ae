//! Order book error types

use super::registry::OrderId;
use super::types::{Action, BookSide};
use thiserror::Error;

/// Errors that can occur while maintaining order books.
///
/// Inside the update path these are logged and folded into
/// [`UpdateEffect::Error`](super::types::UpdateEffect::Error); management
/// calls (configuration, subscription, registration) return them directly.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BookError {
    /// The entry cannot be applied as given.
    #[error("malformed entry: {reason}")]
    MalformedEntry {
        /// What was wrong with the entry
        reason: String,
    },

    /// A `New` arrived for an order that is already live.
    #[error("duplicate new for live order {order_id}")]
    DuplicateOrder {
        /// The offending order identifier
        order_id: OrderId,
    },

    /// A `Change`/`Delete` referenced an order that is not live.
    #[error("{action} for unknown order {order_id}")]
    UnknownOrder {
        /// The referenced order identifier
        order_id: OrderId,
        /// The action that referenced it
        action: Action,
    },

    /// The order registry has no free slot left.
    #[error("order registry full: capacity {capacity}, rejected order {order_id}")]
    RegistryFull {
        /// Configured registry capacity
        capacity: usize,
        /// The order that could not be stored
        order_id: OrderId,
    },

    /// A per-order update was sent to a book without an order registry.
    #[error("order registry is not enabled for {symbol}")]
    RegistryDisabled {
        /// Instrument symbol of the book
        symbol: String,
    },

    /// Sequence counters are not newer than the last applied ones.
    #[error("stale sequence: rpt_seq {rpt_seq} (last {last_rpt_seq}), seq_num {seq_num} (last {last_seq_num})")]
    StaleSequence {
        /// Incoming report sequence
        rpt_seq: u64,
        /// Last applied report sequence
        last_rpt_seq: u64,
        /// Incoming sequence number
        seq_num: u64,
        /// Last applied sequence number
        last_seq_num: u64,
    },

    /// A full-amount level would go below zero.
    #[error("negative quantity {resulting} at {side} {price}")]
    NegativeQuantity {
        /// Book side of the level
        side: BookSide,
        /// Level price
        price: f64,
        /// Quantity the update would have produced
        resulting: f64,
    },

    /// A `Change` tried to move an order to the other side of the book.
    #[error("order {order_id} is on {stored}, change requested {requested}")]
    SideMismatch {
        /// The order identifier
        order_id: OrderId,
        /// Side stored in the registry
        stored: BookSide,
        /// Side carried by the update
        requested: BookSide,
    },

    /// The per-chunk dirty list cannot take another book.
    #[error("dirty list full: capacity {capacity}")]
    DirtyListFull {
        /// Configured capacity
        capacity: usize,
    },

    /// No book is known for the given symbol or security id.
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    /// The instrument is already registered with the connector.
    #[error("instrument already registered: {0}")]
    DuplicateInstrument(String),

    /// The configuration is inconsistent.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Underlying error message
        message: String,
    },

    /// Snapshot integrity check failed.
    #[error("checksum mismatch: expected {expected}, but computed {actual}")]
    ChecksumMismatch {
        /// Checksum stored in the snapshot
        expected: String,
        /// Checksum computed from the payload
        actual: String,
    },
}

impl BookError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        BookError::MalformedEntry {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        BookError::InvalidConfig {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for BookError {
    #[cold]
    fn from(err: serde_json::Error) -> Self {
        BookError::Serialization {
            message: err.to_string(),
        }
    }
}
