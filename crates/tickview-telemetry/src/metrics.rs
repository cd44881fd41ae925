//! Prometheus metrics for tickview.
//!
//! Covers:
//! - Quote ingest (accepted, dropped, cycles)
//! - Poll health (failures, latency)
//! - Transport state and push failover
//! - Portfolio value
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a startup bug. These panics only occur
//! during static initialization, never at runtime.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    CounterVec, Encoder, Gauge, GaugeVec, Histogram, IntCounter, TextEncoder,
};

/// Transport states exported on the state gauge.
pub const TRANSPORT_STATES: [&str; 4] = ["init", "push_active", "poll_active", "closed"];

/// Quotes accepted into the book.
/// Labels: source (push/poll)
pub static QUOTES_INGESTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickview_quotes_ingested_total",
        "Total quotes applied to the quote book",
        &["source"]
    )
    .unwrap()
});

/// Quotes dropped before reaching the book.
/// Labels: reason (malformed/stale)
pub static QUOTES_DROPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickview_quotes_dropped_total",
        "Total quote records dropped",
        &["reason"]
    )
    .unwrap()
});

pub static INGEST_CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickview_ingest_cycles_total",
        "Total ingest cycles processed",
        &["source"]
    )
    .unwrap()
});

/// Failed poll cycles.
/// Labels: kind (timeout/http/status/decode/auth)
pub static POLL_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickview_poll_failures_total",
        "Total failed poll cycles",
        &["kind"]
    )
    .unwrap()
});

pub static POLL_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "tickview_poll_latency_ms",
        "Poll fetch latency in milliseconds",
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap()
});

/// Transport selector state (1 = active, 0 = inactive).
pub static TRANSPORT_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "tickview_transport_state",
        "Transport selector current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

pub static PUSH_FAILOVER_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tickview_push_failover_total",
        "Total failovers from push channel to polling",
        &["reason"]
    )
    .unwrap()
});

pub static PUSH_RECONNECT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "tickview_push_reconnect_total",
        "Total push channel reconnection attempts"
    )
    .unwrap()
});

pub static PORTFOLIO_VALUE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "tickview_portfolio_value",
        "Total account value (cash + market value)"
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    pub fn quotes_ingested(source: &str, count: u64) {
        QUOTES_INGESTED_TOTAL
            .with_label_values(&[source])
            .inc_by(count as f64);
    }

    pub fn quotes_dropped(reason: &str, count: u64) {
        if count > 0 {
            QUOTES_DROPPED_TOTAL
                .with_label_values(&[reason])
                .inc_by(count as f64);
        }
    }

    pub fn ingest_cycle(source: &str) {
        INGEST_CYCLES_TOTAL.with_label_values(&[source]).inc();
    }

    pub fn poll_failed(kind: &str) {
        POLL_FAILURES_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn poll_latency(latency_ms: f64) {
        POLL_LATENCY_MS.observe(latency_ms);
    }

    /// Set the transport state gauge. Only the active state is 1.
    pub fn transport_state_set(state: &str) {
        for s in TRANSPORT_STATES {
            TRANSPORT_STATE.with_label_values(&[s]).set(0.0);
        }
        TRANSPORT_STATE.with_label_values(&[state]).set(1.0);
    }

    pub fn push_failover(reason: &str) {
        PUSH_FAILOVER_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn push_reconnects(count: u64) {
        PUSH_RECONNECT_TOTAL.inc_by(count);
    }

    pub fn portfolio_value(value: f64) {
        PORTFOLIO_VALUE.set(value);
    }

    /// Render the default registry in the text exposition format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        Ok(String::from_utf8(buf)?)
    }
}
