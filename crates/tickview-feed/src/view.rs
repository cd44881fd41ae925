//! Derived, sortable projection of the quote set.

use crate::baseline::BaselineTracker;
use crate::book::QuoteBook;
use crate::history::PriceHistory;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tickview_core::{Direction, Price, Symbol};

/// Column a view is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortKey {
    Symbol,
    Price,
    /// Percent change against the baseline.
    Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Sort specification. Starts at `{Symbol, Asc}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::Symbol,
            direction: SortDirection::Asc,
        }
    }
}

impl SortSpec {
    /// Direction used when switching to a different key.
    pub const KEY_CHANGE_DIRECTION: SortDirection = SortDirection::Desc;

    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Same key flips direction; a different key resets to descending.
    pub fn toggle(self, key: SortKey) -> Self {
        if key == self.key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::new(key, Self::KEY_CHANGE_DIRECTION)
        }
    }
}

/// One row of the derived view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRow {
    pub symbol: Symbol,
    pub price: Price,
    pub baseline: Price,
    pub percent_change: Decimal,
    pub direction: Direction,
    /// Recent prices, oldest first.
    pub history: Vec<Price>,
}

/// Build the view rows for every quote in the book, sorted per `spec`.
///
/// Pre-sort order is the book's first-seen order; the sort is stable so
/// equal keys keep that order in both directions.
pub fn build_view(
    book: &QuoteBook,
    baselines: &BaselineTracker,
    history: &PriceHistory,
    spec: SortSpec,
) -> Vec<ViewRow> {
    let mut rows: Vec<ViewRow> = book
        .quotes()
        .iter()
        .map(|quote| {
            let baseline = baselines.baseline(&quote.symbol).unwrap_or(quote.price);
            let indicator = baselines.indicator(&quote.symbol, quote.price);
            ViewRow {
                symbol: quote.symbol.clone(),
                price: quote.price,
                baseline,
                percent_change: indicator.percent_change,
                direction: indicator.direction,
                history: history.snapshot(&quote.symbol),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        let ord = compare(a, b, spec.key);
        match spec.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    rows
}

fn compare(a: &ViewRow, b: &ViewRow, key: SortKey) -> Ordering {
    match key {
        SortKey::Symbol => a.symbol.cmp(&b.symbol),
        SortKey::Price => a.price.cmp(&b.price),
        SortKey::Trend => a.percent_change.cmp(&b.percent_change),
    }
}
