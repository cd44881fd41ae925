//! Portfolio valuation for tickview.
//!
//! Joins externally owned positions against the freshest quotes to produce
//! per-position and aggregate unrealized P/L.

pub mod error;
pub mod valuator;

pub use error::{PortfolioError, PortfolioResult};
pub use valuator::{
    value_portfolio, PortfolioValuation, Position, PositionValuation, PriceLookup, PriceSource,
};
