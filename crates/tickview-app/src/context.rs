//! Session context: who the session acts for.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn can_trade(&self) -> bool {
        matches!(self, Self::User)
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(SessionError::Config(format!("unknown role: {other:?}"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Credentials and identity for one session.
///
/// Created by the host and moved into the session at start; dropped (and the
/// token wiped) when the session is stopped.
pub struct SessionContext {
    session_id: Uuid,
    token: Option<Zeroizing<String>>,
    role: Role,
}

impl SessionContext {
    pub fn new(token: Option<String>, role: Role) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            token: token.filter(|t| !t.is_empty()).map(Zeroizing::new),
            role,
        }
    }

    /// Unauthenticated session (quotes only).
    pub fn anonymous() -> Self {
        Self::new(None, Role::User)
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.as_str())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}
