//! Core domain types for the tickview quote engine.
//!
//! This crate provides the types shared by every other crate:
//! - `Symbol`: Instrument identifier (e.g., "AAPL")
//! - `Price`, `Quantity`: Precision-safe numeric types
//! - `Quote`: Canonical `{symbol, price, observed_at}` observation plus its receive time
//! - `Direction`: Trend direction derived from a baseline

pub mod decimal;
pub mod error;
pub mod quote;

pub use decimal::{Price, Quantity};
pub use error::{CoreError, Result};
pub use quote::{Direction, Quote, QuoteSource, Symbol};
