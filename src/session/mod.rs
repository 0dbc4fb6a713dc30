/// Browser sessions
///
/// A session is keyed by an opaque cookie value and holds the authenticated
/// identity, the time-lock override and the login failure counters.

mod attempts;
mod store;

pub use attempts::LoginAttempts;
pub use store::{MemorySessionStore, SessionStore, SessionUpdate};

use chrono::{DateTime, Utc};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "lune_session";

/// Per-browser state
#[derive(Debug, Clone)]
pub struct SessionData {
    /// Authenticated username, if logged in
    pub user: Option<String>,
    /// Time-lock override, sticky once granted
    pub unlock_override: bool,
    pub attempts: LoginAttempts,
    pub touched_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            user: None,
            unlock_override: false,
            attempts: LoginAttempts::default(),
            touched_at: now,
        }
    }
}

/// Session id attached to each request by the session middleware
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
