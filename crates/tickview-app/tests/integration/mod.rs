//! Integration tests for tickview sessions.
//!
//! These tests run a full session against in-process collaborators:
//! - Mock push channel (WebSocket)
//! - Mock REST API (prices, portfolio, trades, candles, system)

pub mod common;
