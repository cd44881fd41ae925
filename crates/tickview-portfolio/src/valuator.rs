//! Portfolio Valuator.
//!
//! For each position the current price is the live quote when one exists,
//! otherwise the position's average cost. A missing quote therefore yields
//! zero unrealized P/L for that position instead of failing the whole
//! valuation.

use crate::error::PortfolioResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tickview_core::{CoreError, Price, Quantity, Symbol};
use tickview_feed::QuoteBook;
use tracing::trace;

/// Source of current prices.
pub trait PriceLookup {
    fn price_of(&self, symbol: &Symbol) -> Option<Price>;
}

impl PriceLookup for QuoteBook {
    fn price_of(&self, symbol: &Symbol) -> Option<Price> {
        self.price(symbol)
    }
}

impl PriceLookup for HashMap<Symbol, Price> {
    fn price_of(&self, symbol: &Symbol) -> Option<Price> {
        self.get(symbol).copied()
    }
}

/// Held position, owned by the external ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub quantity: Quantity,
    pub average_cost: Price,
}

impl Position {
    pub fn new(symbol: &str, quantity: Quantity, average_cost: Price) -> PortfolioResult<Self> {
        let symbol = Symbol::new(symbol)?;
        if quantity.inner().is_sign_negative() && !quantity.is_zero() {
            return Err(CoreError::InvalidQuantity(format!("{symbol}: {quantity}")).into());
        }
        if average_cost.is_negative() {
            return Err(CoreError::InvalidPrice(format!("{symbol}: average cost {average_cost}")).into());
        }
        Ok(Self {
            symbol,
            quantity,
            average_cost,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Current quote from the book.
    Live,
    /// No quote; average cost used.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionValuation {
    pub symbol: Symbol,
    pub quantity: Quantity,
    pub average_cost: Price,
    pub current_price: Price,
    pub price_source: PriceSource,
    /// `average_cost * quantity`
    pub cost: Decimal,
    /// `current_price * quantity`
    pub market_value: Decimal,
    /// `market_value - cost`
    pub unrealized_pl: Decimal,
}

impl PositionValuation {
    pub fn compute(position: &Position, quotes: &impl PriceLookup) -> Self {
        let (current_price, price_source) = match quotes.price_of(&position.symbol) {
            Some(p) => (p, PriceSource::Live),
            None => {
                trace!(symbol = %position.symbol, "No quote, valuing at average cost");
                (position.average_cost, PriceSource::Fallback)
            }
        };

        let cost = position.quantity.notional(position.average_cost);
        let market_value = position.quantity.notional(current_price);

        Self {
            symbol: position.symbol.clone(),
            quantity: position.quantity,
            average_cost: position.average_cost,
            current_price,
            price_source,
            cost,
            market_value,
            unrealized_pl: market_value.saturating_sub(cost),
        }
    }
}

/// Aggregate valuation of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub cash: Decimal,
    pub positions: Vec<PositionValuation>,
    pub total_cost: Decimal,
    pub total_market_value: Decimal,
    pub total_unrealized_pl: Decimal,
    /// `cash + total_market_value`
    pub total_value: Decimal,
    /// Account status reported by the ledger.
    pub status: Option<String>,
}

/// Value every position against `quotes`.
pub fn value_portfolio(
    cash: Decimal,
    positions: &[Position],
    status: Option<String>,
    quotes: &impl PriceLookup,
) -> PortfolioValuation {
    let positions: Vec<PositionValuation> = positions
        .iter()
        .map(|p| PositionValuation::compute(p, quotes))
        .collect();

    // Server-supplied figures can be arbitrarily large; totals saturate.
    let total_cost = positions
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.cost));
    let total_market_value = positions
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.market_value));

    PortfolioValuation {
        cash,
        total_cost,
        total_market_value,
        total_unrealized_pl: total_market_value.saturating_sub(total_cost),
        total_value: cash.saturating_add(total_market_value),
        positions,
        status,
    }
}
