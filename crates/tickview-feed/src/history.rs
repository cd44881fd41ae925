//! Bounded per-symbol price history.

use std::collections::{HashMap, VecDeque};
use tickview_core::{Price, Symbol};

/// Maximum samples retained per symbol.
pub const HISTORY_CAPACITY: usize = 20;

/// Ring buffer of recent prices per symbol, oldest first.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    capacity: usize,
    samples: HashMap<Symbol, VecDeque<Price>>,
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history with a custom per-symbol capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a sample, evicting the oldest once the buffer is full.
    pub fn record(&mut self, symbol: &Symbol, price: Price) {
        let buf = self
            .samples
            .entry(symbol.clone())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back(price);
    }

    /// Samples for one symbol, oldest first. Empty for unknown symbols.
    pub fn snapshot(&self, symbol: &Symbol) -> Vec<Price> {
        self.samples
            .get(symbol)
            .map(|buf| buf.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn snapshot_all(&self) -> HashMap<Symbol, Vec<Price>> {
        self.samples
            .iter()
            .map(|(sym, buf)| (sym.clone(), buf.iter().copied().collect()))
            .collect()
    }

    pub fn len(&self, symbol: &Symbol) -> usize {
        self.samples.get(symbol).map_or(0, VecDeque::len)
    }
}
