//! Push channel error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timed out after {0}ms")]
    Timeout(u64),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),
}

impl WsError {
    /// Short label used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "connect_failed",
            Self::Timeout(_) => "timeout",
            Self::ConnectionClosed { .. } => "closed",
            Self::SendFailed(_) => "send_failed",
            Self::Tungstenite(_) => "protocol",
        }
    }
}

pub type WsResult<T> = Result<T, WsError>;
