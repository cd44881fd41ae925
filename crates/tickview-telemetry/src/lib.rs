//! Prometheus metrics and structured logging for tickview.
//!
//! - Structured logging through `tracing` (JSON in production)
//! - Prometheus collectors for ingest, transport and portfolio state

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
