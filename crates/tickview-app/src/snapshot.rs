//! Read-only session snapshot published after every cycle.

use crate::transport::TransportState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tickview_core::{Price, Quote, Symbol};
use tickview_feed::{SortSpec, ViewRow};
use tickview_portfolio::PortfolioValuation;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Ingest cycles processed so far.
    pub cycle: u64,
    pub transport: TransportState,
    pub sort: SortSpec,
    /// Current quotes in first-seen order.
    pub quotes: Vec<Quote>,
    /// Recent prices per symbol, oldest first.
    pub histories: BTreeMap<Symbol, Vec<Price>>,
    /// Sorted derived view.
    pub view: Vec<ViewRow>,
    /// Set once a portfolio has been loaded.
    pub portfolio: Option<PortfolioValuation>,
    /// Trading switch from the last system status fetch.
    pub trading_enabled: Option<bool>,
    /// Most recent poll failure, cleared by the next successful poll.
    pub last_poll_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn row(&self, symbol: &str) -> Option<&ViewRow> {
        self.view.iter().find(|r| r.symbol.as_str() == symbol)
    }

    pub fn history(&self, symbol: &str) -> &[Price] {
        self.histories
            .get(symbol)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
