//! Connector configuration.

use crate::orderbook::config::BookConfig;
use crate::orderbook::error::BookError;
use crate::stats::LatencySinkKind;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default capacity of the per-chunk dirty list.
pub const DEFAULT_MAX_DIRTY_BOOKS: usize = 1_024;

/// Feed-level switches of a market-data connector.
///
/// Loaded from JSON with [`ConnectorConfig::from_json`] or built in code with
/// the `with_*` setters. Missing JSON fields take their defaults.
///
/// ```
/// use feedbook_rs::connector::ConnectorConfig;
///
/// let config = ConnectorConfig::from_json(
///     r#"{ "name": "binance-spot", "relaxed_books": true, "book": { "max_depth": 10 } }"#,
/// )
/// .unwrap();
/// assert_eq!(config.book.max_depth, Some(10));
/// assert!(config.relaxed_books);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Name used in logs
    pub name: String,

    /// Feed is delivered over multicast (UDP); otherwise TCP-style
    pub is_multicast: bool,

    /// Feed sends incremental updates; `false` for snapshot-only feeds
    pub has_incremental: bool,

    /// Start in Dynamic-Init mode (multicast incremental feeds only)
    pub dynamic_init: bool,

    /// Tolerate crossed books (banded or aggregated quote feeds)
    pub relaxed_books: bool,

    /// Maximum number of distinct books dirtied within one chunk
    pub max_dirty_books: usize,

    /// Forward trades to subscribed strategies
    pub notify_trades: bool,

    /// Backend of the latency statistics
    pub latency_sink: LatencySinkKind,

    /// Book interpretation switches
    pub book: BookConfig,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            name: "mdc".to_string(),
            is_multicast: false,
            has_incremental: true,
            dynamic_init: false,
            relaxed_books: false,
            max_dirty_books: DEFAULT_MAX_DIRTY_BOOKS,
            notify_trades: true,
            latency_sink: LatencySinkKind::default(),
            book: BookConfig::default(),
        }
    }
}

impl ConnectorConfig {
    /// Default configuration with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    /// [`BookError::Serialization`] on malformed JSON,
    /// [`BookError::InvalidConfig`] on an invalid combination of switches.
    pub fn from_json(json: &str) -> Result<Self, BookError> {
        let config: ConnectorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets multicast delivery.
    #[must_use]
    pub fn with_multicast(mut self, is_multicast: bool) -> Self {
        self.is_multicast = is_multicast;
        self
    }

    /// Sets whether the feed has incremental updates.
    #[must_use]
    pub fn with_incremental(mut self, has_incremental: bool) -> Self {
        self.has_incremental = has_incremental;
        self
    }

    /// Requests Dynamic-Init mode.
    #[must_use]
    pub fn with_dynamic_init(mut self, dynamic_init: bool) -> Self {
        self.dynamic_init = dynamic_init;
        self
    }

    /// Sets relaxed (crossing tolerant) books.
    #[must_use]
    pub fn with_relaxed_books(mut self, relaxed: bool) -> Self {
        self.relaxed_books = relaxed;
        self
    }

    /// Sets the dirty list capacity.
    #[must_use]
    pub fn with_max_dirty_books(mut self, max_dirty_books: usize) -> Self {
        self.max_dirty_books = max_dirty_books;
        self
    }

    /// Sets trade forwarding.
    #[must_use]
    pub fn with_notify_trades(mut self, notify_trades: bool) -> Self {
        self.notify_trades = notify_trades;
        self
    }

    /// Sets the latency statistics backend.
    #[must_use]
    pub fn with_latency_sink(mut self, kind: LatencySinkKind) -> Self {
        self.latency_sink = kind;
        self
    }

    /// Sets the book configuration.
    #[must_use]
    pub fn with_book(mut self, book: BookConfig) -> Self {
        self.book = book;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// [`BookError::InvalidConfig`] for an empty dirty list or an invalid
    /// book configuration.
    pub fn validate(&self) -> Result<(), BookError> {
        if self.max_dirty_books == 0 {
            return Err(BookError::invalid_config("max_dirty_books must be positive"));
        }
        self.book.validate()
    }

    /// Dynamic-Init only makes sense for multicast incremental feeds.
    pub(crate) fn effective_dynamic_init(&self) -> bool {
        if self.dynamic_init && !(self.is_multicast && self.has_incremental) {
            warn!(
                "{}: dynamic init requires a multicast incremental feed, disabled",
                self.name
            );
            return false;
        }
        self.dynamic_init
    }

    /// Books become initialized on any successful update instead of on
    /// a multicast snapshot.
    pub(crate) fn initializes_on_update(&self) -> bool {
        !self.has_incremental || !self.is_multicast
    }
}
