//! REST client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
    /// Missing credential, or the server answered 401/403.
    #[error("Authentication required")]
    AuthRequired,

    /// Business error reported by the server, message verbatim.
    #[error("Trade rejected: {0}")]
    TradeRejected(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RestError {
    /// Short label used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthRequired => "auth",
            Self::TradeRejected(_) => "rejected",
            Self::Timeout => "timeout",
            Self::Http(_) => "http",
            Self::Status { .. } => "status",
            Self::Json(_) => "decode",
        }
    }
}

impl From<reqwest::Error> for RestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Http(format!("Failed to decode response: {e}"))
        } else {
            Self::Http(e.to_string())
        }
    }
}

pub type RestResult<T> = Result<T, RestError>;
