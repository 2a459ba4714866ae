//! Book set shared by a primary connector and its secondaries.

use super::subscription::Subscription;
use crate::feed::SymbolKey;
use crate::orderbook::book::OrderBook;
use crate::orderbook::config::BookConfig;
use crate::orderbook::error::BookError;
use crate::orderbook::instrument::Instrument;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Every book of a connector together with its subscribers.
///
/// Books are addressed by their index, assigned at registration and stable
/// for the lifetime of the set.
#[derive(Debug)]
pub struct BookSet {
    pub(super) config: BookConfig,
    pub(super) books: Vec<OrderBook>,
    pub(super) subscribers: Vec<Vec<Subscription>>,
    pub(super) risk_registered: Vec<bool>,
    by_symbol: HashMap<String, usize>,
    by_security_id: HashMap<u64, usize>,
}

impl BookSet {
    /// Creates an empty set whose books use `config`.
    pub fn new(config: BookConfig) -> Self {
        Self {
            config,
            books: Vec::new(),
            subscribers: Vec::new(),
            risk_registered: Vec::new(),
            by_symbol: HashMap::new(),
            by_security_id: HashMap::new(),
        }
    }

    /// Creates the book of `instrument`.
    ///
    /// The book is reachable by symbol, alternate symbol and security id.
    ///
    /// # Errors
    /// [`BookError::DuplicateInstrument`] if any of these keys is taken.
    pub fn add_instrument(&mut self, instrument: Arc<Instrument>) -> Result<usize, BookError> {
        let taken = self.by_symbol.contains_key(&instrument.symbol)
            || instrument
                .alt_symbol
                .as_ref()
                .is_some_and(|alt| self.by_symbol.contains_key(alt))
            || instrument
                .security_id
                .is_some_and(|id| self.by_security_id.contains_key(&id));
        if taken {
            return Err(BookError::DuplicateInstrument(instrument.symbol.clone()));
        }

        let id = self.books.len();
        self.by_symbol.insert(instrument.symbol.clone(), id);
        if let Some(alt) = &instrument.alt_symbol {
            self.by_symbol.insert(alt.clone(), id);
        }
        if let Some(security_id) = instrument.security_id {
            self.by_security_id.insert(security_id, id);
        }
        debug!("book {} created for {}", id, instrument);
        self.books
            .push(OrderBook::new(instrument, self.config.clone()));
        self.subscribers.push(Vec::new());
        self.risk_registered.push(false);
        Ok(id)
    }

    /// Index of the book `key` refers to.
    #[inline]
    pub fn resolve(&self, key: SymbolKey<'_>) -> Option<usize> {
        match key {
            SymbolKey::Symbol(symbol) => self.by_symbol.get(symbol).copied(),
            SymbolKey::SecurityId(id) => self.by_security_id.get(&id).copied(),
        }
    }

    /// Book at `index`.
    pub fn get(&self, index: usize) -> Option<&OrderBook> {
        self.books.get(index)
    }

    /// Book of `symbol`.
    pub fn find(&self, symbol: &str) -> Option<&OrderBook> {
        self.resolve(SymbolKey::Symbol(symbol))
            .and_then(|index| self.books.get(index))
    }

    pub(crate) fn find_mut(&mut self, symbol: &str) -> Option<&mut OrderBook> {
        let index = self.resolve(SymbolKey::Symbol(symbol))?;
        self.books.get_mut(index)
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// True when no instrument is registered.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Every book, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderBook> + '_ {
        self.books.iter()
    }

    /// Configuration shared by the books.
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Subscriptions of the book at `index`, ascending by threshold.
    pub fn subscribers(&self, index: usize) -> &[Subscription] {
        self.subscribers
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether risk is notified for the book at `index`.
    pub fn is_risk_registered(&self, index: usize) -> bool {
        self.risk_registered.get(index).copied().unwrap_or(false)
    }

    /// Clears and un-initializes every book.
    pub(crate) fn invalidate_all(&mut self) {
        for book in &mut self.books {
            book.invalidate();
        }
    }
}
