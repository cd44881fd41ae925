//! Transport Selector.
//!
//! Runs as one supervisor task per session:
//!
//! ```text
//! INIT ──push configured──> PUSH_ACTIVE ──failure──> POLL_ACTIVE ──stop──> CLOSED
//!   └────no push url───────────────────────────────────┘
//! ```
//!
//! The phases run one after the other inside the same task, so a poll loop
//! can only start after the push channel is gone, and there is never more
//! than one poll timer.

use crate::engine::EngineEvent;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tickview_rest::RestClient;
use tickview_telemetry::Metrics;
use tickview_ws::{ConnectionConfig, ConnectionManager, PushFrame};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the frame channel between the push client and the selector.
const FRAME_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportState {
    #[default]
    Init,
    PushActive,
    PollActive,
    Closed,
}

impl TransportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::PushActive => "push_active",
            Self::PollActive => "poll_active",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

pub struct TransportSelector {
    push: Option<ConnectionConfig>,
    poll: PollSettings,
    rest: RestClient,
    events: mpsc::Sender<EngineEvent>,
    shutdown_token: CancellationToken,
}

impl TransportSelector {
    pub fn new(
        push: Option<ConnectionConfig>,
        poll: PollSettings,
        rest: RestClient,
        events: mpsc::Sender<EngineEvent>,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            push,
            poll,
            rest,
            events,
            shutdown_token,
        }
    }

    /// Drive the state machine until shutdown.
    pub async fn run(self) {
        if let Some(config) = self.push.clone() {
            if !self.transition(TransportState::PushActive).await {
                return;
            }
            if !self.run_push(config).await {
                return;
            }
        } else {
            info!("No push endpoint configured, polling only");
        }

        if !self.transition(TransportState::PollActive).await {
            return;
        }
        self.run_poll().await;
        debug!("Transport selector exited");
    }

    /// Returns `false` when the session is shutting down.
    async fn transition(&self, state: TransportState) -> bool {
        if self.shutdown_token.is_cancelled() {
            return false;
        }
        match state {
            TransportState::PollActive => warn!(state = %state, "Transport state changed"),
            _ => info!(state = %state, "Transport state changed"),
        }
        Metrics::transport_state_set(state.as_str());
        self.emit(EngineEvent::TransportChanged(state)).await
    }

    async fn emit(&self, event: EngineEvent) -> bool {
        if self.events.send(event).await.is_err() {
            debug!("Engine receiver dropped");
            return false;
        }
        true
    }

    /// Run the push channel. Returns `true` if the selector should fail over
    /// to polling, `false` on shutdown.
    async fn run_push(&self, config: ConnectionConfig) -> bool {
        let (frame_tx, mut frame_rx) = mpsc::channel::<PushFrame>(FRAME_BUFFER);
        let manager = ConnectionManager::new(config, frame_tx, self.shutdown_token.child_token());

        let connect = manager.connect();
        tokio::pin!(connect);

        let result = loop {
            tokio::select! {
                res = &mut connect => break res,
                Some(frame) = frame_rx.recv() => {
                    if !self.emit(EngineEvent::PushFrame(frame)).await {
                        return false;
                    }
                }
            }
        };

        // Frames received before the channel ended still count.
        while let Ok(frame) = frame_rx.try_recv() {
            if !self.emit(EngineEvent::PushFrame(frame)).await {
                return false;
            }
        }

        let reconnects = manager.reconnect_count();
        if reconnects > 0 {
            Metrics::push_reconnects(u64::from(reconnects));
        }

        match result {
            Ok(()) => false,
            Err(e) => {
                warn!(error = %e, reconnects, "Push channel unavailable, failing over to polling");
                Metrics::push_failover(e.kind());
                !self.shutdown_token.is_cancelled()
            }
        }
    }

    async fn run_poll(&self) {
        let mut ticker = tokio::time::interval(self.poll.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_ms = self.poll.interval.as_millis() as u64,
            timeout_ms = self.poll.timeout.as_millis() as u64,
            "Polling started"
        );

        loop {
            tokio::select! {
                biased;
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested, stopping poll loop");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            let fetched = tokio::select! {
                biased;
                () = self.shutdown_token.cancelled() => return,
                res = tokio::time::timeout(self.poll.timeout, self.rest.fetch_prices()) => res,
            };
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            let event = match fetched {
                Ok(Ok(payload)) => {
                    Metrics::poll_latency(latency_ms);
                    EngineEvent::PollSnapshot {
                        payload,
                        received_at: Utc::now(),
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, kind = e.kind(), "Poll cycle failed");
                    Metrics::poll_failed(e.kind());
                    EngineEvent::PollFailed(e.to_string())
                }
                Err(_) => {
                    warn!(timeout_ms = self.poll.timeout.as_millis() as u64, "Poll cycle timed out");
                    Metrics::poll_failed("timeout");
                    EngineEvent::PollFailed(format!(
                        "poll timed out after {}ms",
                        self.poll.timeout.as_millis()
                    ))
                }
            };

            if !self.emit(event).await {
                return;
            }
        }
    }
}
