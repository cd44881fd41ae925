//! Current quote per symbol.
//!
//! Keeps symbols in first-seen order so views built from the book have a
//! stable pre-sort order.

use std::collections::HashMap;
use tickview_core::{Price, Quote, Symbol};

/// Result of applying a quote to the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// First quote for this symbol.
    Inserted,
    /// Replaced an existing quote.
    Updated,
    /// Ignored: server timestamp older than the stored quote's.
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    quotes: Vec<Quote>,
    index: HashMap<Symbol, usize>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a quote. Equal timestamps replace (last write wins).
    pub fn apply(&mut self, quote: Quote) -> ApplyOutcome {
        match self.index.get(&quote.symbol) {
            Some(&idx) => {
                let slot = &mut self.quotes[idx];
                if quote.is_older_than(slot) {
                    return ApplyOutcome::Stale;
                }
                *slot = quote;
                ApplyOutcome::Updated
            }
            None => {
                self.index.insert(quote.symbol.clone(), self.quotes.len());
                self.quotes.push(quote);
                ApplyOutcome::Inserted
            }
        }
    }

    /// Keep only quotes matching `keep`, preserving first-seen order.
    /// Returns the number of quotes removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Quote) -> bool) -> usize {
        let before = self.quotes.len();
        self.quotes.retain(|q| keep(q));
        if self.quotes.len() != before {
            self.index = self
                .quotes
                .iter()
                .enumerate()
                .map(|(idx, q)| (q.symbol.clone(), idx))
                .collect();
        }
        before - self.quotes.len()
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&Quote> {
        self.index.get(symbol).map(|&idx| &self.quotes[idx])
    }

    pub fn price(&self, symbol: &Symbol) -> Option<Price> {
        self.get(symbol).map(|q| q.price)
    }

    /// All quotes in first-seen order.
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
