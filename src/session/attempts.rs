/// Login failure counters
use std::collections::HashMap;

/// Identity → consecutive failure count, scoped to one session.
///
/// Switching the attempted identity resets that identity's counter, so a
/// count only ever reflects an uninterrupted run of attempts on one name.
#[derive(Debug, Clone, Default)]
pub struct LoginAttempts {
    last_identity: Option<String>,
    counts: HashMap<String, u32>,
}

impl LoginAttempts {
    /// Start an attempt for `identity`, resetting its counter when the
    /// previous attempt was made under a different name.
    pub fn begin(&mut self, identity: &str) {
        if self.last_identity.as_deref() != Some(identity) {
            self.counts.insert(identity.to_string(), 0);
            self.last_identity = Some(identity.to_string());
        }
    }

    /// Record a failure and return the new count
    pub fn record_failure(&mut self, identity: &str) -> u32 {
        let count = self.counts.entry(identity.to_string()).or_insert(0);
        *count += 1;
        self.last_identity = Some(identity.to_string());
        *count
    }

    pub fn reset(&mut self, identity: &str) {
        self.counts.remove(identity);
        if self.last_identity.as_deref() == Some(identity) {
            self.last_identity = None;
        }
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.last_identity = None;
    }

    pub fn count(&self, identity: &str) -> u32 {
        self.counts.get(identity).copied().unwrap_or(0)
    }

    pub fn last_identity(&self) -> Option<&str> {
        self.last_identity.as_deref()
    }
}
