/// Time-lock policy
///
/// Until the configured unlock instant the site only answers the exempt
/// paths; every other request is redirected to the lock page unless the
/// session carries an override.
use crate::{clock::Clock, config::AccessConfig};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Lock page location
pub const LOCK_PATH: &str = "/locked";

/// Paths reachable while locked
const EXEMPT_PATHS: &[&str] = &["/login", "/logout", LOCK_PATH, "/unlock", "/health"];
const EXEMPT_PREFIXES: &[&str] = &["/static/", "/health/"];

/// Pure decision: `now >= unlock_at` or an override is held.
pub fn access_allowed(now: DateTime<Utc>, unlock_at: Option<DateTime<Utc>>, has_override: bool) -> bool {
    match unlock_at {
        None => true,
        Some(unlock_at) => now >= unlock_at || has_override,
    }
}

/// Whether `path` stays reachable while the site is locked
pub fn is_exempt(path: &str) -> bool {
    EXEMPT_PATHS.contains(&path) || EXEMPT_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Snapshot of the lock state for the lock page
#[derive(Debug, Clone, serde::Serialize)]
pub struct LockStatus {
    pub locked: bool,
    pub unlock_at: Option<DateTime<Utc>>,
    pub seconds_remaining: i64,
    pub has_override: bool,
}

pub struct AccessGate {
    unlock_at: Option<DateTime<Utc>>,
    override_name: Option<String>,
    override_secret: Option<String>,
    clock: Arc<dyn Clock>,
}

impl AccessGate {
    pub fn new(config: &AccessConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            unlock_at: config.unlock_at,
            override_name: config
                .override_name
                .as_deref()
                .map(crate::account::normalize_identity),
            override_secret: config.override_secret.clone(),
            clock,
        }
    }

    /// Locked right now, ignoring any override
    pub fn is_locked(&self) -> bool {
        !access_allowed(self.clock.now(), self.unlock_at, false)
    }

    /// Whether a request to `path` may proceed
    pub fn permits(&self, path: &str, has_override: bool) -> bool {
        is_exempt(path) || access_allowed(self.clock.now(), self.unlock_at, has_override)
    }

    /// Check an override challenge against the configured pair
    pub fn verify_override(&self, name: &str, secret: &str) -> bool {
        match (&self.override_name, &self.override_secret) {
            (Some(expected_name), Some(expected_secret)) => {
                crate::account::normalize_identity(name) == *expected_name
                    && secret == expected_secret
            }
            _ => false,
        }
    }

    pub fn status(&self, has_override: bool) -> LockStatus {
        let now = self.clock.now();
        let seconds_remaining = self
            .unlock_at
            .map(|at| (at - now).num_seconds().max(0))
            .unwrap_or(0);

        LockStatus {
            locked: self.is_locked(),
            unlock_at: self.unlock_at,
            seconds_remaining,
            has_override,
        }
    }
}
