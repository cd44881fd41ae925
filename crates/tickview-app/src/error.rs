//! Session error types.
//!
//! Transport and poll failures are absorbed inside the session; these are
//! the errors callers of the session handle can see.

use thiserror::Error;
use tickview_rest::RestError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Fetch failed: {0}")]
    PollFetch(String),

    #[error("Malformed quote: {0}")]
    MalformedQuote(String),

    /// Server-reported business error, message verbatim.
    #[error("{0}")]
    TradeRejected(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session closed")]
    Closed,
}

impl From<RestError> for SessionError {
    fn from(e: RestError) -> Self {
        match e {
            RestError::AuthRequired => Self::AuthRequired,
            RestError::TradeRejected(msg) => Self::TradeRejected(msg),
            other => Self::PollFetch(other.to_string()),
        }
    }
}

impl From<tickview_ws::WsError> for SessionError {
    fn from(e: tickview_ws::WsError) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<tickview_feed::FeedError> for SessionError {
    fn from(e: tickview_feed::FeedError) -> Self {
        Self::MalformedQuote(e.to_string())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
