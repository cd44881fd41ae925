//! Quote feed processing for tickview.
//!
//! Turns raw transport payloads into canonical quotes and maintains the
//! per-instrument state the derived view is computed from:
//! - `QuoteNormalizer`: payload -> `Quote` records, malformed records dropped
//! - `QuoteBook`: current quote set, last-write-wins, stale rejection
//! - `PriceHistory`: bounded sliding window of recent prices per symbol
//! - `BaselineTracker`: reference price for direction / percent change
//! - `build_view`: indicator-annotated, stably sorted projection

pub mod baseline;
pub mod book;
pub mod error;
pub mod history;
pub mod normalizer;
pub mod view;

pub use baseline::{BaselineTracker, Indicator};
pub use book::{ApplyOutcome, QuoteBook};
pub use error::{FeedError, FeedResult};
pub use history::{PriceHistory, HISTORY_CAPACITY};
pub use normalizer::{NormalizedBatch, NormalizerStats, QuoteNormalizer};
pub use view::{build_view, SortDirection, SortKey, SortSpec, ViewRow};
