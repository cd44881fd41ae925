//! Quote normalization.
//!
//! Converts push-channel messages (a single JSON object) and poll responses
//! (a JSON array) into canonical [`Quote`] records.
//!
//! Accepted record shape: `{"symbol": "AAPL", "current_price": 150.25}` where
//! the price may also be a numeric string and `price` is accepted as an alias.
//! An optional `observed_at` (RFC 3339 string or Unix milliseconds) is kept
//! as the server timestamp; every quote also carries the receive time. Records that fail validation are dropped individually;
//! the rest of the batch is still processed.

use crate::error::{FeedError, FeedResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tickview_core::{Price, Quote, QuoteSource, Symbol};
use tracing::{debug, trace};

/// Accepted/dropped record counters.
#[derive(Debug, Default)]
pub struct NormalizerStats {
    accepted_count: AtomicU64,
    dropped_count: AtomicU64,
}

impl NormalizerStats {
    pub fn record_accepted(&self, n: u64) {
        self.accepted_count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, n: u64) {
        self.dropped_count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }
}

/// Raw quote record as sent by either transport.
#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default, alias = "price")]
    current_price: Option<Value>,
    #[serde(default)]
    observed_at: Option<Value>,
}

/// Result of normalizing one payload.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    /// Canonical quotes, at most one per symbol.
    pub quotes: Vec<Quote>,
    /// Number of records dropped as malformed.
    pub dropped: usize,
}

impl NormalizedBatch {
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Stateless payload-to-quote converter with running statistics.
#[derive(Debug, Default)]
pub struct QuoteNormalizer {
    stats: NormalizerStats,
}

impl QuoteNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &NormalizerStats {
        &self.stats
    }

    /// Normalize a text frame (push channel).
    ///
    /// A frame that is not valid JSON yields an empty batch with one drop.
    pub fn normalize_text(
        &self,
        text: &str,
        source: QuoteSource,
        received_at: DateTime<Utc>,
    ) -> NormalizedBatch {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.normalize_value(&value, source, received_at),
            Err(e) => {
                debug!(error = %FeedError::Json(e), %source, "Dropping unparseable payload");
                self.stats.record_dropped(1);
                NormalizedBatch {
                    quotes: Vec::new(),
                    dropped: 1,
                }
            }
        }
    }

    /// Normalize an already-decoded payload.
    ///
    /// Arrays are treated as batches, objects as single records. Within one
    /// payload a repeated symbol keeps its first position but takes the last
    /// value.
    pub fn normalize_value(
        &self,
        payload: &Value,
        source: QuoteSource,
        received_at: DateTime<Utc>,
    ) -> NormalizedBatch {
        let records: &[Value] = match payload {
            Value::Array(items) => items,
            Value::Object(_) => std::slice::from_ref(payload),
            _ => {
                debug!(%source, "Dropping payload that is neither object nor array");
                self.stats.record_dropped(1);
                return NormalizedBatch {
                    quotes: Vec::new(),
                    dropped: 1,
                };
            }
        };

        let mut quotes: Vec<Quote> = Vec::with_capacity(records.len());
        let mut positions: HashMap<Symbol, usize> = HashMap::with_capacity(records.len());
        let mut dropped = 0usize;

        for record in records {
            match parse_record(record, source, received_at) {
                Ok(quote) => match positions.get(&quote.symbol) {
                    Some(&idx) => {
                        trace!(symbol = %quote.symbol, "Duplicate symbol in payload, last write wins");
                        quotes[idx] = quote;
                    }
                    None => {
                        positions.insert(quote.symbol.clone(), quotes.len());
                        quotes.push(quote);
                    }
                },
                Err(e) => {
                    debug!(error = %e, %source, "Dropping quote record");
                    dropped += 1;
                }
            }
        }

        self.stats.record_accepted(quotes.len() as u64);
        self.stats.record_dropped(dropped as u64);

        NormalizedBatch { quotes, dropped }
    }
}

fn parse_record(
    record: &Value,
    source: QuoteSource,
    received_at: DateTime<Utc>,
) -> FeedResult<Quote> {
    let raw: RawQuote = serde_json::from_value(record.clone())
        .map_err(|e| FeedError::MalformedQuote(format!("unexpected shape: {e}")))?;

    let symbol = raw
        .symbol
        .as_deref()
        .ok_or_else(|| FeedError::MalformedQuote("missing symbol".to_string()))
        .and_then(|s| Symbol::new(s).map_err(|e| FeedError::MalformedQuote(e.to_string())))?;

    let price = raw
        .current_price
        .as_ref()
        .ok_or_else(|| FeedError::MalformedQuote(format!("{symbol}: missing price")))
        .and_then(|v| {
            parse_price(v).ok_or_else(|| FeedError::MalformedQuote(format!("{symbol}: non-numeric price {v}")))
        })?;

    if price.is_negative() {
        return Err(FeedError::MalformedQuote(format!(
            "{symbol}: negative price {price}"
        )));
    }

    let quote = Quote::new(symbol, price, received_at, source);
    Ok(match raw.observed_at.as_ref().and_then(parse_observed_at) {
        Some(observed_at) => quote.with_observed_at(observed_at),
        None => quote,
    })
}

fn parse_price(value: &Value) -> Option<Price> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
    .map(Price::new)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn parse_observed_at(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_poll_batch_normalized() {
        let normalizer = QuoteNormalizer::new();
        let payload = json!([
            {"symbol": "AAPL", "current_price": 150},
            {"symbol": "MSFT", "current_price": "410.25"}
        ]);

        let batch = normalizer.normalize_value(&payload, QuoteSource::Poll, now());

        assert_eq!(batch.dropped, 0);
        assert_eq!(batch.quotes.len(), 2);
        assert_eq!(batch.quotes[0].symbol.as_str(), "AAPL");
        assert_eq!(batch.quotes[0].price, Price::new(dec!(150)));
        assert_eq!(batch.quotes[1].price, Price::new(dec!(410.25)));
        assert_eq!(batch.quotes[1].source, QuoteSource::Poll);
        assert_eq!(batch.quotes[1].received_at, now());
        assert!(batch.quotes[1].observed_at.is_none());
    }

    #[test]
    fn test_push_message_normalized() {
        let normalizer = QuoteNormalizer::new();
        let batch = normalizer.normalize_text(
            r#"{"symbol":"TSLA","current_price":201.5}"#,
            QuoteSource::Push,
            now(),
        );

        assert_eq!(batch.quotes.len(), 1);
        assert_eq!(batch.quotes[0].symbol.as_str(), "TSLA");
        assert_eq!(batch.quotes[0].price, Price::new(dec!(201.5)));
        assert_eq!(batch.quotes[0].source, QuoteSource::Push);
    }

    #[test]
    fn test_malformed_records_dropped_batch_continues() {
        let normalizer = QuoteNormalizer::new();
        let payload = json!([
            {"current_price": 10},
            {"symbol": "AAPL", "current_price": "abc"},
            {"symbol": "", "current_price": 5},
            {"symbol": "NEG", "current_price": -1},
            {"symbol": "NOPRICE"},
            {"symbol": 42, "current_price": 1},
            "garbage",
            {"symbol": "MSFT", "current_price": 400}
        ]);

        let batch = normalizer.normalize_value(&payload, QuoteSource::Poll, now());

        assert_eq!(batch.quotes.len(), 1);
        assert_eq!(batch.quotes[0].symbol.as_str(), "MSFT");
        assert_eq!(batch.dropped, 7);
        assert_eq!(normalizer.stats().accepted(), 1);
        assert_eq!(normalizer.stats().dropped(), 7);
    }

    #[test]
    fn test_duplicate_symbol_last_write_wins() {
        let normalizer = QuoteNormalizer::new();
        let payload = json!([
            {"symbol": "AAPL", "current_price": 150},
            {"symbol": "MSFT", "current_price": 400},
            {"symbol": "AAPL", "current_price": 151}
        ]);

        let batch = normalizer.normalize_value(&payload, QuoteSource::Poll, now());

        assert_eq!(batch.quotes.len(), 2);
        assert_eq!(batch.quotes[0].symbol.as_str(), "AAPL");
        assert_eq!(batch.quotes[0].price, Price::new(dec!(151)));
        assert_eq!(batch.quotes[1].symbol.as_str(), "MSFT");
    }

    #[test]
    fn test_price_alias_accepted() {
        let normalizer = QuoteNormalizer::new();
        let batch =
            normalizer.normalize_value(&json!({"symbol": "AAPL", "price": 99.9}), QuoteSource::Push, now());

        assert_eq!(batch.quotes[0].price, Price::new(dec!(99.9)));
    }

    #[test]
    fn test_zero_price_accepted() {
        let normalizer = QuoteNormalizer::new();
        let batch =
            normalizer.normalize_value(&json!({"symbol": "ZERO", "current_price": 0}), QuoteSource::Push, now());

        assert_eq!(batch.quotes.len(), 1);
        assert!(batch.quotes[0].price.is_zero());
    }

    #[test]
    fn test_observed_at_millis_and_rfc3339() {
        let normalizer = QuoteNormalizer::new();
        let payload = json!([
            {"symbol": "A", "current_price": 1, "observed_at": 1_700_000_000_000_i64},
            {"symbol": "B", "current_price": 1, "observed_at": "2024-03-01T11:59:00Z"},
            {"symbol": "C", "current_price": 1, "observed_at": "yesterday"}
        ]);

        let batch = normalizer.normalize_value(&payload, QuoteSource::Poll, now());

        assert_eq!(
            batch.quotes[0].observed_at.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
        assert_eq!(
            batch.quotes[1].observed_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 11, 59, 0).unwrap())
        );
        assert_eq!(batch.quotes[2].observed_at, None);
        assert!(batch.quotes.iter().all(|q| q.received_at == now()));
    }

    #[test]
    fn test_invalid_json_text_dropped() {
        let normalizer = QuoteNormalizer::new();
        let batch = normalizer.normalize_text("{not json", QuoteSource::Push, now());

        assert!(batch.is_empty());
        assert_eq!(batch.dropped, 1);
    }

    #[test]
    fn test_scalar_payload_dropped() {
        let normalizer = QuoteNormalizer::new();
        let batch = normalizer.normalize_value(&json!(12), QuoteSource::Poll, now());

        assert!(batch.is_empty());
        assert_eq!(batch.dropped, 1);
    }
}
