//! tickview: live quote synchronization and analytics.
//!
//! A session acquires quotes over a push channel (failing over to interval
//! polling), keeps per-symbol history and baselines, derives trend
//! indicators and a sortable view, and values the user's portfolio against
//! the freshest quotes. Everything is published as a read-only
//! [`SessionSnapshot`] after each ingest cycle.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod transport;

pub use config::AppConfig;
pub use context::{Role, SessionContext};
pub use engine::{EngineEvent, SessionEngine};
pub use error::{SessionError, SessionResult};
pub use session::{Session, SessionHandle};
pub use snapshot::SessionSnapshot;
pub use transport::{PollSettings, TransportSelector, TransportState};

pub use tickview_feed::{SortDirection, SortKey, SortSpec, ViewRow};
pub use tickview_rest::TradeSide;
