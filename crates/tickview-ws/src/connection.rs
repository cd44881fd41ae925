//! Push channel connection manager.
//!
//! Opens one WebSocket subscription, forwards every text frame downstream and
//! reports why the channel ended. Reconnection is optional and bounded; once
//! the attempts are used up the caller decides what to fall back to.

use crate::error::{WsError, WsResult};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL (`ws://` or `wss://`).
    pub url: String,
    /// Sent once right after each successful open, if set.
    pub subscribe_message: Option<String>,
    /// Upper bound on the connect handshake.
    pub connect_timeout_ms: u64,
    /// Reconnection attempts after the first failure (0 = none).
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub reconnect_max_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            subscribe_message: None,
            connect_timeout_ms: 5000,
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 30000,
        }
    }
}

/// Text frame received on the push channel.
#[derive(Debug, Clone)]
pub struct PushFrame {
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// WebSocket connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    frame_tx: mpsc::Sender<PushFrame>,
    shutdown_token: CancellationToken,
    reconnect_count: AtomicU32,
}

impl ConnectionManager {
    pub fn new(
        config: ConnectionConfig,
        frame_tx: mpsc::Sender<PushFrame>,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            frame_tx,
            shutdown_token,
            reconnect_count: AtomicU32::new(0),
        }
    }

    /// Number of reconnection attempts made so far.
    pub fn reconnect_count(&self) -> u32 {
        self.reconnect_count.load(Ordering::Relaxed)
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Connect and run the message loop until the channel is gone for good.
    ///
    /// Returns `Ok(())` only on shutdown. Any other exit is an error carrying
    /// the reason of the last failure, after reconnection attempts (if any)
    /// are exhausted.
    pub async fn connect(&self) -> WsResult<()> {
        let mut attempt = 0u32;

        loop {
            if self.is_shutdown() {
                info!("Shutdown requested, exiting connect loop");
                return Ok(());
            }

            let err = match self.try_connect(&mut attempt).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            warn!(error = %err, kind = err.kind(), "Push channel failed");

            if self.is_shutdown() {
                info!("Shutdown requested after disconnect, not reconnecting");
                return Ok(());
            }

            attempt += 1;
            if attempt > self.config.max_reconnect_attempts {
                if self.config.max_reconnect_attempts > 0 {
                    error!(attempt, "Max reconnection attempts reached");
                }
                return Err(err);
            }
            self.reconnect_count.fetch_add(1, Ordering::Relaxed);

            let delay = backoff_delay(
                self.config.reconnect_base_delay_ms,
                self.config.reconnect_max_delay_ms,
                attempt,
            );
            warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting push channel");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during backoff, exiting");
                    return Ok(());
                }
            }
        }
    }

    async fn try_connect(&self, attempt: &mut u32) -> WsResult<()> {
        info!(url = %self.config.url, "Connecting push channel");

        let timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let connecting = connect_async_tls_with_config(&self.config.url, None, true, None);
        let (ws_stream, _response) = tokio::select! {
            () = self.shutdown_token.cancelled() => return Ok(()),
            res = tokio::time::timeout(timeout, connecting) => match res {
                Ok(conn) => conn.map_err(|e| WsError::ConnectionFailed(e.to_string()))?,
                Err(_) => return Err(WsError::Timeout(self.config.connect_timeout_ms)),
            },
        };
        let (mut write, mut read) = ws_stream.split();

        *attempt = 0;
        info!("Push channel connected");

        if let Some(subscribe) = &self.config.subscribe_message {
            write
                .send(Message::Text(subscribe.clone()))
                .await
                .map_err(|e| WsError::SendFailed(e.to_string()))?;
            debug!("Subscribe message sent");
        }

        loop {
            tokio::select! {
                biased;

                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in message loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!(error = %e, "Failed to send Close frame during shutdown");
                    }
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let frame = PushFrame { text, received_at: Utc::now() };
                            if self.frame_tx.send(frame).await.is_err() {
                                warn!("Frame receiver dropped");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "Push channel closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Push channel read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("Push channel stream ended");
                            return Err(WsError::ConnectionClosed {
                                code: 1006,
                                reason: "Stream ended".to_string(),
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Exponential backoff: `base * 2^(attempt-1)`, capped at `max`, plus jitter.
pub fn backoff_delay(base_ms: u64, max_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let delay = base_ms.saturating_mul(1u64 << exponent).min(max_ms);
    Duration::from_millis(delay + rand_jitter(base_ms))
}

/// Random jitter in `[0, min(base, 1000))` ms.
fn rand_jitter(base_ms: u64) -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let bound = base_ms.clamp(1, 1000);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    u64::from(nanos) % bound
}
