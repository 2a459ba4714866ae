//! Shape of an inbound message as seen by the batch processor.

use super::update::{NormalizedUpdate, SymbolKey};

/// A decoded venue message holding one or more normalized entries.
///
/// Adapters implement this on their own message structs so that
/// [`MarketDataConnector::process_message`](crate::connector::MarketDataConnector::process_message)
/// is monomorphized per venue.
pub trait FeedMessage {
    /// Number of entries in the message.
    fn entry_count(&self) -> usize;

    /// Entry at `index` (`index < entry_count()`).
    fn entry(&self, index: usize) -> &NormalizedUpdate;

    /// Instrument the entry at `index` refers to.
    fn symbol_or_id(&self, index: usize) -> SymbolKey<'_>;

    /// Venue event time of the entry at `index`, nanoseconds, 0 if unknown.
    fn event_timestamp(&self, index: usize) -> u64;

    /// False while more fragments of the same logical message follow.
    fn is_last_fragment(&self) -> bool {
        true
    }
}

/// Owned instrument key of a [`NormalizedMessage`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstrumentKey {
    /// Venue symbol
    Symbol(String),
    /// Numeric security id
    SecurityId(u64),
}

impl InstrumentKey {
    /// Borrowed form used for lookups.
    pub fn as_key(&self) -> SymbolKey<'_> {
        match self {
            InstrumentKey::Symbol(symbol) => SymbolKey::Symbol(symbol),
            InstrumentKey::SecurityId(id) => SymbolKey::SecurityId(*id),
        }
    }
}

#[derive(Debug, Clone)]
struct MessageEntry {
    key: InstrumentKey,
    exchange_ts: u64,
    update: NormalizedUpdate,
}

/// A `Vec`-backed [`FeedMessage`] for adapters without a message struct of
/// their own, replay tools and tests.
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    entries: Vec<MessageEntry>,
    last_fragment: bool,
}

impl Default for NormalizedMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizedMessage {
    /// Creates an empty, complete message.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            last_fragment: true,
        }
    }

    /// Creates an empty message with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            last_fragment: true,
        }
    }

    /// Appends an entry addressed by symbol.
    pub fn push(&mut self, symbol: &str, exchange_ts: u64, update: NormalizedUpdate) -> &mut Self {
        self.entries.push(MessageEntry {
            key: InstrumentKey::Symbol(symbol.to_string()),
            exchange_ts,
            update,
        });
        self
    }

    /// Appends an entry addressed by security id.
    pub fn push_by_id(
        &mut self,
        security_id: u64,
        exchange_ts: u64,
        update: NormalizedUpdate,
    ) -> &mut Self {
        self.entries.push(MessageEntry {
            key: InstrumentKey::SecurityId(security_id),
            exchange_ts,
            update,
        });
        self
    }

    /// Marks whether this is the last fragment of a logical message.
    #[must_use]
    pub fn with_last_fragment(mut self, last_fragment: bool) -> Self {
        self.last_fragment = last_fragment;
        self
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the message carries no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_fragment = true;
    }
}

impl FeedMessage for NormalizedMessage {
    #[inline]
    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn entry(&self, index: usize) -> &NormalizedUpdate {
        &self.entries[index].update
    }

    #[inline]
    fn symbol_or_id(&self, index: usize) -> SymbolKey<'_> {
        self.entries[index].key.as_key()
    }

    #[inline]
    fn event_timestamp(&self, index: usize) -> u64 {
        self.entries[index].exchange_ts
    }

    fn is_last_fragment(&self) -> bool {
        self.last_fragment
    }
}
