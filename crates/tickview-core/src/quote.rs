//! Instrument identification and quote observation types.

use crate::{CoreError, Price, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Instrument symbol (e.g., "AAPL").
///
/// The unique key for every per-instrument structure in the engine.
/// Surrounding whitespace is trimmed; the symbol itself is kept verbatim,
/// so "aapl" and "AAPL" are distinct instruments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol, rejecting empty or whitespace-only input.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidSymbol(raw.as_ref().to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Transport a quote arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// Push channel message.
    Push,
    /// Interval poll snapshot.
    Poll,
}

impl QuoteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Poll => "poll",
        }
    }
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical quote observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Last price.
    pub price: Price,
    /// Server-supplied observation time, when the record carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
    /// Local time the payload carrying this quote arrived.
    pub received_at: DateTime<Utc>,
    /// Transport the observation arrived through.
    pub source: QuoteSource,
}

impl Quote {
    pub fn new(symbol: Symbol, price: Price, received_at: DateTime<Utc>, source: QuoteSource) -> Self {
        Self {
            symbol,
            price,
            observed_at: None,
            received_at,
            source,
        }
    }

    pub fn with_observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = Some(observed_at);
        self
    }

    /// Whether this quote is older than `stored`.
    ///
    /// Only server timestamps are compared. If either side lacks one, the
    /// later arrival wins and the quote is never stale.
    pub fn is_older_than(&self, stored: &Quote) -> bool {
        match (self.observed_at, stored.observed_at) {
            (Some(incoming), Some(current)) => incoming < current,
            _ => false,
        }
    }
}

/// Trend direction of a price relative to its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Rising,
    Falling,
}

impl Direction {
    /// Direction of `current` relative to `baseline`. A zero delta is rising.
    pub fn between(baseline: Price, current: Price) -> Self {
        if current >= baseline {
            Self::Rising
        } else {
            Self::Falling
        }
    }

    pub fn is_rising(&self) -> bool {
        matches!(self, Self::Rising)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => write!(f, "RISING"),
            Self::Falling => write!(f, "FALLING"),
        }
    }
}
