//! Session engine.
//!
//! The single owner of all mutable session state: quote book, baselines,
//! history, sort spec and the loaded portfolio. Transports and the session
//! handle talk to it only through [`EngineEvent`]s, processed strictly in
//! arrival order, so no state is ever shared or locked.

use crate::snapshot::SessionSnapshot;
use crate::transport::TransportState;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;
use tickview_core::{QuoteSource, Symbol};
use tickview_feed::{
    build_view, BaselineTracker, NormalizedBatch, PriceHistory, QuoteBook, QuoteNormalizer,
    SortKey, SortSpec,
};
use tickview_portfolio::{value_portfolio, PortfolioValuation, Position};
use tickview_telemetry::Metrics;
use tickview_ws::PushFrame;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Input to the engine.
#[derive(Debug)]
pub enum EngineEvent {
    /// One push channel message (one cycle).
    PushFrame(PushFrame),
    /// One poll response (one cycle).
    PollSnapshot {
        payload: Value,
        received_at: DateTime<Utc>,
    },
    /// A poll cycle failed; state is left untouched.
    PollFailed(String),
    TransportChanged(TransportState),
    ToggleSort {
        key: SortKey,
        reply: oneshot::Sender<SortSpec>,
    },
    PortfolioLoaded {
        cash: Decimal,
        positions: Vec<Position>,
        status: Option<String>,
        trading_enabled: Option<bool>,
        reply: oneshot::Sender<PortfolioValuation>,
    },
}

/// Portfolio as last reported by the ledger.
#[derive(Debug, Clone)]
struct LoadedPortfolio {
    cash: Decimal,
    positions: Vec<Position>,
    status: Option<String>,
}

pub struct SessionEngine {
    normalizer: QuoteNormalizer,
    book: QuoteBook,
    baselines: BaselineTracker,
    history: PriceHistory,
    sort: SortSpec,
    portfolio: Option<LoadedPortfolio>,
    trading_enabled: Option<bool>,
    transport: TransportState,
    cycle: u64,
    last_poll_error: Option<String>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionEngine {
    pub fn new(snapshot_tx: watch::Sender<SessionSnapshot>) -> Self {
        Self {
            normalizer: QuoteNormalizer::new(),
            book: QuoteBook::new(),
            baselines: BaselineTracker::new(),
            history: PriceHistory::new(),
            sort: SortSpec::default(),
            portfolio: None,
            trading_enabled: None,
            transport: TransportState::Init,
            cycle: 0,
            last_poll_error: None,
            snapshot_tx,
        }
    }

    /// Process events until shutdown or until every sender is gone.
    ///
    /// Publishes a final `Closed` snapshot on exit; the snapshot channel
    /// closes when the engine is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<EngineEvent>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }

        self.transport = TransportState::Closed;
        Metrics::transport_state_set(self.transport.as_str());
        self.publish();
        info!(cycles = self.cycle, "Session engine stopped");
    }

    pub fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::PushFrame(frame) => {
                let batch =
                    self.normalizer
                        .normalize_text(&frame.text, QuoteSource::Push, frame.received_at);
                self.ingest(batch, QuoteSource::Push);
            }
            EngineEvent::PollSnapshot {
                payload,
                received_at,
            } => {
                let batch = self
                    .normalizer
                    .normalize_value(&payload, QuoteSource::Poll, received_at);
                self.last_poll_error = None;
                self.ingest(batch, QuoteSource::Poll);
            }
            EngineEvent::PollFailed(reason) => {
                self.last_poll_error = Some(reason);
                self.publish();
            }
            EngineEvent::TransportChanged(state) => {
                self.transport = state;
                self.publish();
            }
            EngineEvent::ToggleSort { key, reply } => {
                self.sort = self.sort.toggle(key);
                debug!(key = ?self.sort.key, direction = ?self.sort.direction, "Sort changed");
                self.publish();
                let _ = reply.send(self.sort);
            }
            EngineEvent::PortfolioLoaded {
                cash,
                positions,
                status,
                trading_enabled,
                reply,
            } => {
                self.portfolio = Some(LoadedPortfolio {
                    cash,
                    positions,
                    status,
                });
                if trading_enabled.is_some() {
                    self.trading_enabled = trading_enabled;
                }
                self.publish();
                if let Some(valuation) = self.valuation() {
                    let _ = reply.send(valuation);
                }
            }
        }
    }

    /// Apply one cycle's quotes.
    ///
    /// For each quote: stale observations are dropped; otherwise the baseline
    /// rolls to the pre-update price (or is seeded on first sight), the book
    /// is updated and the price is appended to the history.
    ///
    /// A poll response is the full quote set, so symbols it no longer lists
    /// leave the book. Their history and baseline are kept.
    fn ingest(&mut self, batch: NormalizedBatch, source: QuoteSource) {
        let mut applied = 0u64;
        let mut stale = 0u64;
        let listed: HashSet<Symbol> = batch.quotes.iter().map(|q| q.symbol.clone()).collect();

        for quote in batch.quotes {
            match self.book.get(&quote.symbol) {
                Some(stored) if quote.is_older_than(stored) => {
                    trace!(symbol = %quote.symbol, "Dropping stale quote");
                    stale += 1;
                    continue;
                }
                Some(stored) => {
                    let previous = stored.price;
                    self.baselines.roll(&quote.symbol, previous);
                }
                None => self.baselines.observe(&quote.symbol, quote.price),
            }

            let symbol = quote.symbol.clone();
            let price = quote.price;
            self.book.apply(quote);
            self.history.record(&symbol, price);
            applied += 1;
        }

        if source == QuoteSource::Poll {
            let removed = self.book.retain(|q| listed.contains(&q.symbol));
            if removed > 0 {
                debug!(removed, "Symbols absent from poll snapshot removed");
            }
        }

        self.cycle += 1;
        Metrics::ingest_cycle(source.as_str());
        Metrics::quotes_ingested(source.as_str(), applied);
        Metrics::quotes_dropped("malformed", batch.dropped as u64);
        Metrics::quotes_dropped("stale", stale);
        trace!(cycle = self.cycle, %source, applied, dropped = batch.dropped, stale, "Cycle ingested");

        self.publish();
    }

    fn valuation(&self) -> Option<PortfolioValuation> {
        self.portfolio
            .as_ref()
            .map(|p| value_portfolio(p.cash, &p.positions, p.status.clone(), &self.book))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let portfolio = self.valuation();
        if let Some(value) = portfolio.as_ref().and_then(|v| v.total_value.to_f64()) {
            Metrics::portfolio_value(value);
        }

        SessionSnapshot {
            cycle: self.cycle,
            transport: self.transport,
            sort: self.sort,
            quotes: self.book.quotes().to_vec(),
            histories: self.history.snapshot_all().into_iter().collect(),
            view: build_view(&self.book, &self.baselines, &self.history, self.sort),
            portfolio,
            trading_enabled: self.trading_enabled,
            last_poll_error: self.last_poll_error.clone(),
            updated_at: Some(Utc::now()),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
