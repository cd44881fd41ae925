//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,tickview=debug";

/// Initialize structured logging.
///
/// `RUST_LOG` overrides the filter. `default_level` (e.g. from config)
/// replaces the `info` part of [`DEFAULT_FILTER`]. JSON output when
/// `RUST_ENV=production`, pretty output otherwise.
pub fn init_logging(default_level: Option<&str>) -> TelemetryResult<()> {
    let fallback = match default_level {
        Some(level) if !level.is_empty() => format!("{level},tickview=debug"),
        _ => DEFAULT_FILTER.to_string(),
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let result = if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
