//! REST collaborator client for tickview.
//!
//! Typed access to the endpoints the quote engine consumes:
//! - `GET /instruments/prices`: poll fallback snapshot
//! - `GET /portfolio`: held positions and cash (authenticated)
//! - `GET /candles/{symbol}`: OHLC records, passed through verbatim
//! - `POST /trade/{buy|sell}`: order submission (authenticated)
//! - `GET /system`: trading switch

pub mod client;
pub mod error;
pub mod types;

pub use client::{RestClient, DEFAULT_TIMEOUT};
pub use error::{RestError, RestResult};
pub use types::{PortfolioResponse, PositionRecord, SystemStatus, TradeRequest, TradeSide};
