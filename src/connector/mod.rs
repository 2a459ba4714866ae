//! Market-data connector: owns the books of one feed, applies normalized
//! messages and notifies subscribed strategies.
//!
//! A connector is driven from a single thread. Per inbound chunk the caller
//! invokes [`MarketDataConnector::process_message`] for every decoded message
//! and then [`MarketDataConnector::end_of_chunk`].
//!
//! ```
//! use std::sync::Arc;
//! use feedbook_rs::prelude::*;
//!
//! let mut mdc = MarketDataConnector::new(ConnectorConfig::new("demo")).unwrap();
//! mdc.add_instrument(Arc::new(Instrument::new("BTCUSDT", 0.01))).unwrap();
//!
//! let mut msg = NormalizedMessage::new();
//! msg.push("BTCUSDT", 1, NormalizedUpdate::level(BookSide::Bid, Action::New, 100.0, 2.0));
//! msg.push("BTCUSDT", 1, NormalizedUpdate::level(BookSide::Ask, Action::New, 101.0, 1.0));
//! let outcome = mdc.process_snapshot(&msg, RecvTimes::default());
//! assert_eq!(outcome.applied, 2);
//! assert!(mdc.end_of_chunk());
//!
//! let spread = mdc.with_book("BTCUSDT", |book| book.spread()).flatten();
//! assert_eq!(spread, Some(1.0));
//! ```

mod batch;
mod books;
pub mod config;
mod dirty;
pub mod listener;
mod notify;
mod subscription;
mod verify;

pub use batch::BatchOutcome;
pub use books::BookSet;
pub use config::{ConnectorConfig, DEFAULT_MAX_DIRTY_BOOKS};
pub use dirty::{DirtyBook, DirtyList, RecvTimes};
pub use listener::{
    BookUpdateEvent, ListenerError, OrderManager, RiskManager, Strategy, TradingEvent,
};
pub use subscription::Subscription;
pub use verify::ConsistencyVerifier;

use crate::orderbook::book::OrderBook;
use crate::orderbook::error::BookError;
use crate::orderbook::instrument::Instrument;
use crate::orderbook::registry::{OrderId, RequestId};
use crate::stats::LatencyStats;
use crate::utils::current_time_nanos;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Whether a connector owns its book set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorRole {
    /// Owns the books; clears them on stop and drop
    Primary,
    /// Shares the books of a primary; never clears them
    Secondary,
}

/// Applies one feed to a set of books.
pub struct MarketDataConnector {
    config: ConnectorConfig,
    role: ConnectorRole,
    books: Rc<RefCell<BookSet>>,
    dirty: DirtyList,
    stats: LatencyStats,
    risk_manager: Option<Arc<dyn RiskManager>>,
    order_manager: Option<Arc<dyn OrderManager>>,
    dynamic_init: bool,
    fragment_pending: bool,
    clock: fn() -> u64,
}

impl std::fmt::Debug for MarketDataConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataConnector")
            .field("name", &self.config.name)
            .field("role", &self.role)
            .field("dirty", &self.dirty.len())
            .field("dynamic_init", &self.dynamic_init)
            .field("fragment_pending", &self.fragment_pending)
            .finish()
    }
}

impl MarketDataConnector {
    /// Creates a primary connector with an empty book set.
    ///
    /// # Errors
    /// [`BookError::InvalidConfig`] if `config` does not validate, or the
    /// latency sink cannot be built.
    pub fn new(config: ConnectorConfig) -> Result<Self, BookError> {
        config.validate()?;
        let books = Rc::new(RefCell::new(BookSet::new(config.book.clone())));
        Self::build(config, ConnectorRole::Primary, books)
    }

    /// Creates a connector sharing the books of `primary`.
    ///
    /// Books keep the configuration of the primary; a differing `config.book`
    /// is ignored with a warning.
    ///
    /// # Errors
    /// Same as [`MarketDataConnector::new`].
    pub fn secondary(primary: &MarketDataConnector, config: ConnectorConfig) -> Result<Self, BookError> {
        config.validate()?;
        if config.book != primary.config.book {
            warn!(
                "{}: book configuration differs from primary {}, using the primary's",
                config.name, primary.config.name
            );
        }
        Self::build(config, ConnectorRole::Secondary, Rc::clone(&primary.books))
    }

    fn build(
        config: ConnectorConfig,
        role: ConnectorRole,
        books: Rc<RefCell<BookSet>>,
    ) -> Result<Self, BookError> {
        let stats = LatencyStats::from_kind(config.latency_sink)?;
        let dynamic_init = config.effective_dynamic_init();
        info!("{}: created as {:?}", config.name, role);
        Ok(Self {
            dirty: DirtyList::new(config.max_dirty_books),
            config,
            role,
            books,
            stats,
            risk_manager: None,
            order_manager: None,
            dynamic_init,
            fragment_pending: false,
            clock: current_time_nanos,
        })
    }

    /// Replaces the clock used for book-update and strategy timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Attaches a risk manager.
    #[must_use]
    pub fn with_risk_manager(mut self, risk_manager: Arc<dyn RiskManager>) -> Self {
        self.risk_manager = Some(risk_manager);
        self
    }

    /// Attaches the order manager receiving own fills.
    #[must_use]
    pub fn with_order_manager(mut self, order_manager: Arc<dyn OrderManager>) -> Self {
        self.order_manager = Some(order_manager);
        self
    }

    /// Replaces the latency statistics.
    #[must_use]
    pub fn with_latency_stats(mut self, stats: LatencyStats) -> Self {
        self.stats = stats;
        self
    }

    /// Configuration of this connector.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Primary or secondary.
    pub fn role(&self) -> ConnectorRole {
        self.role
    }

    /// Creates the book of `instrument` and returns its index.
    ///
    /// # Errors
    /// [`BookError::DuplicateInstrument`] if the instrument is known.
    pub fn add_instrument(&mut self, instrument: Arc<Instrument>) -> Result<usize, BookError> {
        self.books.borrow_mut().add_instrument(instrument)
    }

    /// Read access to the book set.
    pub fn books(&self) -> Ref<'_, BookSet> {
        self.books.borrow()
    }

    /// Runs `f` on the book of `symbol`.
    pub fn with_book<R>(&self, symbol: &str, f: impl FnOnce(&OrderBook) -> R) -> Option<R> {
        self.books.borrow().find(symbol).map(f)
    }

    /// Books dirtied in the current chunk.
    pub fn dirty(&self) -> &DirtyList {
        &self.dirty
    }

    /// Latency statistics of notified updates.
    pub fn latency_stats(&self) -> &LatencyStats {
        &self.stats
    }

    /// Mutable latency statistics, e.g. to reset them.
    pub fn latency_stats_mut(&mut self) -> &mut LatencyStats {
        &mut self.stats
    }

    /// True while notifications are suppressed by Dynamic-Init.
    pub fn is_dynamic_init(&self) -> bool {
        self.dynamic_init
    }

    /// Leaves Dynamic-Init; it cannot be entered again.
    pub fn end_dynamic_init(&mut self) {
        if self.dynamic_init {
            info!("{}: dynamic init finished", self.config.name);
            self.dynamic_init = false;
        }
    }

    /// True while the last message seen was not a last fragment.
    pub fn is_fragment_pending(&self) -> bool {
        self.fragment_pending
    }

    /// Associates the venue order `order_id` on `symbol` with the own
    /// request `request`, so that its fills are routed to the order manager.
    ///
    /// Returns `true` when the order is already live in the book.
    ///
    /// # Errors
    /// [`BookError::UnknownInstrument`] or [`BookError::RegistryDisabled`].
    pub fn register_order(
        &mut self,
        symbol: &str,
        order_id: OrderId,
        request: RequestId,
    ) -> Result<bool, BookError> {
        let mut set = self.books.borrow_mut();
        let book = set
            .find_mut(symbol)
            .ok_or_else(|| BookError::UnknownInstrument(symbol.to_string()))?;
        book.register_order(order_id, request)
    }

    /// Forgets the own-order association of `order_id` on `symbol`.
    ///
    /// # Errors
    /// [`BookError::UnknownInstrument`] or [`BookError::RegistryDisabled`].
    pub fn unregister_order(&mut self, symbol: &str, order_id: OrderId) -> Result<(), BookError> {
        let mut set = self.books.borrow_mut();
        let book = set
            .find_mut(symbol)
            .ok_or_else(|| BookError::UnknownInstrument(symbol.to_string()))?;
        let registry = book.registry_mut().ok_or(BookError::RegistryDisabled {
            symbol: symbol.to_string(),
        })?;
        registry.unregister_own(order_id);
        Ok(())
    }

    /// Drops pending notifications and, on a primary, clears every book.
    /// Subscribers receive [`TradingEvent::MarketDataReset`].
    pub fn reset(&mut self) {
        self.invalidate(TradingEvent::MarketDataReset);
    }

    /// Stops the connector. Subscribers receive [`TradingEvent::Stopped`].
    pub fn stop(&mut self) {
        self.invalidate(TradingEvent::Stopped);
    }

    fn invalidate(&mut self, event: TradingEvent) {
        info!("{}: {:?}", self.config.name, event);
        self.dirty.clear();
        self.fragment_pending = false;

        let mut set = self.books.borrow_mut();
        if self.role == ConnectorRole::Primary {
            set.invalidate_all();
        }
        // one event per strategy, however many books it follows
        let mut notified: Vec<&Subscription> = Vec::new();
        for subscription in set.subscribers.iter().flatten() {
            if notified.iter().any(|seen| seen.is(&subscription.strategy)) {
                continue;
            }
            notified.push(subscription);
            if let Err(err) = subscription.strategy.on_trading_event(event) {
                error!(
                    "{}: strategy {} failed on {:?}: {}",
                    self.config.name,
                    subscription.strategy.name(),
                    event,
                    err
                );
            }
        }
    }
}

impl Drop for MarketDataConnector {
    fn drop(&mut self) {
        if self.role != ConnectorRole::Primary {
            return;
        }
        match self.books.try_borrow_mut() {
            Ok(mut set) => set.invalidate_all(),
            Err(_) => error!("{}: books borrowed during drop", self.config.name),
        }
    }
}
