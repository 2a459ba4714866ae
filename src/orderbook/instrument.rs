//! Instrument identity as seen by the book engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable description of a traded instrument.
///
/// Owned by the securities-definition registry of the embedding application
/// and shared with books through `Arc<Instrument>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Venue symbol, e.g. `BTCUSDT`
    pub symbol: String,
    /// Alternate symbol some venues use in their feeds
    #[serde(default)]
    pub alt_symbol: Option<String>,
    /// Minimum price increment
    pub price_step: f64,
    /// Settlement date as `YYYYMMDD`, if the instrument has one
    #[serde(default)]
    pub settl_date: Option<u32>,
    /// Numeric security identifier used by FIX/multicast feeds
    #[serde(default)]
    pub security_id: Option<u64>,
}

impl Instrument {
    /// Creates an instrument with only a symbol and a price step.
    pub fn new(symbol: &str, price_step: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            alt_symbol: None,
            price_step,
            settl_date: None,
            security_id: None,
        }
    }

    /// Sets the alternate symbol.
    #[must_use]
    pub fn with_alt_symbol(mut self, alt_symbol: &str) -> Self {
        self.alt_symbol = Some(alt_symbol.to_string());
        self
    }

    /// Sets the numeric security id.
    #[must_use]
    pub fn with_security_id(mut self, security_id: u64) -> Self {
        self.security_id = Some(security_id);
        self
    }

    /// Sets the settlement date.
    #[must_use]
    pub fn with_settl_date(mut self, settl_date: u32) -> Self {
        self.settl_date = Some(settl_date);
        self
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}
