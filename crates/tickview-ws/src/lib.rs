//! Push channel client for tickview quote streams.
//!
//! Provides a single WebSocket subscription with:
//! - Bounded connect timeout
//! - Optional reconnection with exponential backoff and jitter
//! - Optional one-shot subscribe message on open
//! - Channel-based forwarding of text frames stamped with their receive time

pub mod connection;
pub mod error;

pub use connection::{ConnectionConfig, ConnectionManager, PushFrame};
pub use error::{WsError, WsResult};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any `wss://` connection is made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
