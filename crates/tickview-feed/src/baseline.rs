//! Per-symbol baseline tracking.
//!
//! The baseline is the price a symbol's trend is measured against. It is set
//! from the first observed price, and on every later cycle rolls forward to
//! the price that was current before the cycle's update.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tickview_core::{Direction, Price, Symbol};

/// Trend indicator for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub direction: Direction,
    /// `(current - baseline) / baseline * 100`, zero when the baseline is not positive.
    pub percent_change: Decimal,
}

impl Indicator {
    pub fn compute(baseline: Price, current: Price) -> Self {
        Self {
            direction: Direction::between(baseline, current),
            percent_change: current.pct_from(baseline).unwrap_or(Decimal::ZERO),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BaselineTracker {
    baselines: HashMap<Symbol, Price>,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the baseline only if the symbol has none yet.
    pub fn observe(&mut self, symbol: &Symbol, price: Price) {
        self.baselines.entry(symbol.clone()).or_insert(price);
    }

    /// Replace the baseline with the price current before this cycle.
    pub fn roll(&mut self, symbol: &Symbol, previous_current: Price) {
        self.baselines.insert(symbol.clone(), previous_current);
    }

    pub fn baseline(&self, symbol: &Symbol) -> Option<Price> {
        self.baselines.get(symbol).copied()
    }

    /// Indicator for `current`, falling back to `current` itself as the
    /// baseline when the symbol has never been observed.
    pub fn indicator(&self, symbol: &Symbol, current: Price) -> Indicator {
        let baseline = self.baseline(symbol).unwrap_or(current);
        Indicator::compute(baseline, current)
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}
