//! Session lifecycle: `Session::start` spawns the engine and the transport
//! selector, `SessionHandle::stop` tears both down.

use crate::config::AppConfig;
use crate::context::SessionContext;
use crate::engine::{EngineEvent, SessionEngine};
use crate::error::{SessionError, SessionResult};
use crate::snapshot::SessionSnapshot;
use crate::transport::{PollSettings, TransportSelector};
use serde_json::Value;
use tickview_core::Quantity;
use tickview_feed::{SortKey, SortSpec};
use tickview_portfolio::{PortfolioValuation, Position};
use tickview_rest::{RestClient, SystemStatus, TradeRequest, TradeSide, DEFAULT_TIMEOUT};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

pub struct Session;

impl Session {
    /// Start a session. Must be called from within a Tokio runtime.
    pub fn start(config: &AppConfig, context: SessionContext) -> SessionResult<SessionHandle> {
        config.validate()?;

        let rest = RestClient::new(&config.api_url, DEFAULT_TIMEOUT)?;
        let shutdown_token = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::channel(config.session.event_buffer);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let span = info_span!("session", session_id = %context.session_id(), role = %context.role());

        let engine = SessionEngine::new(snapshot_tx);
        let engine_task = tokio::spawn(
            engine
                .run(events_rx, shutdown_token.clone())
                .instrument(span.clone()),
        );

        let selector = TransportSelector::new(
            config.push.connection_config(),
            PollSettings {
                interval: config.poll.interval(),
                timeout: config.poll.timeout(),
            },
            rest.clone(),
            events_tx.clone(),
            shutdown_token.clone(),
        );
        let transport_task = tokio::spawn(selector.run().instrument(span));

        info!(
            session_id = %context.session_id(),
            api_url = %config.api_url,
            push = config.push.url.is_some(),
            "Session started"
        );

        Ok(SessionHandle {
            context,
            rest,
            events: events_tx,
            snapshot_rx,
            shutdown_token,
            tasks: vec![transport_task, engine_task],
        })
    }
}

/// Handle to a running session.
pub struct SessionHandle {
    context: SessionContext,
    rest: RestClient,
    events: mpsc::Sender<EngineEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    shutdown_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified after every cycle. Closed once the session stops.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Toggle the sort on `key` and return the resulting spec.
    pub async fn toggle_sort(&self, key: SortKey) -> SessionResult<SortSpec> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::ToggleSort { key, reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Fetch the portfolio (and the trading switch) and revalue it against
    /// the current quotes.
    pub async fn refresh_portfolio(&self) -> SessionResult<PortfolioValuation> {
        let response = self.rest.fetch_portfolio(self.context.token()).await?;

        let trading_enabled = match self.rest.fetch_system_status().await {
            Ok(status) => Some(status.trading_enabled),
            Err(e) => {
                warn!(error = %e, "System status unavailable");
                None
            }
        };

        let positions: Vec<Position> = response
            .positions
            .iter()
            .filter_map(|record| {
                match Position::new(&record.symbol, record.quantity, record.average_price) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!(error = %e, "Skipping invalid position");
                        None
                    }
                }
            })
            .collect();

        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::PortfolioLoaded {
            cash: response.virtual_cash,
            positions,
            status: response.status,
            trading_enabled,
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Submit a trade, then refresh the portfolio.
    ///
    /// Rejected locally, without a request, for admin sessions, non-positive
    /// quantities and sessions without a token.
    pub async fn trade(
        &self,
        side: TradeSide,
        symbol: &str,
        quantity: Quantity,
    ) -> SessionResult<PortfolioValuation> {
        if self.shutdown_token.is_cancelled() {
            return Err(SessionError::Closed);
        }
        if !self.context.role().can_trade() {
            return Err(SessionError::TradeRejected("Admins cannot trade".to_string()));
        }
        if !quantity.is_positive() {
            return Err(SessionError::TradeRejected(
                "Quantity must be positive".to_string(),
            ));
        }
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(SessionError::TradeRejected("Symbol is required".to_string()));
        }
        if !self.context.is_authenticated() {
            return Err(SessionError::AuthRequired);
        }

        let request = TradeRequest {
            side,
            symbol: symbol.to_string(),
            quantity,
        };
        self.rest.submit_trade(self.context.token(), &request).await?;
        info!(%side, %symbol, %quantity, "Trade accepted");

        self.refresh_portfolio().await
    }

    /// Candle records for `symbol`, verbatim.
    pub async fn candles(&self, symbol: &str) -> SessionResult<Vec<Value>> {
        Ok(self.rest.fetch_candles(symbol).await?)
    }

    pub async fn system_status(&self) -> SessionResult<SystemStatus> {
        Ok(self.rest.fetch_system_status().await?)
    }

    /// Stop the session.
    ///
    /// Cancels the transport and engine and waits for both tasks, so no event
    /// is processed and no snapshot is published after this returns. The
    /// session context (and its token) is dropped here.
    pub async fn stop(self) {
        info!(session_id = %self.context.session_id(), "Stopping session");
        self.shutdown_token.cancel();

        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Session task ended abnormally");
            }
        }
        info!("Session stopped");
    }

    async fn send(&self, event: EngineEvent) -> SessionResult<()> {
        if self.shutdown_token.is_cancelled() {
            return Err(SessionError::Closed);
        }
        self.events.send(event).await.map_err(|_| SessionError::Closed)
    }
}
