/// Account management
///
/// Two fixed accounts seeded from configuration, password login with
/// progressive hints, and profile lookups.

mod manager;
pub mod password;

pub use manager::AccountManager;

use crate::{config::UserSeed, db::models::User};
use serde::{Deserialize, Serialize};

/// Canonical form of a typed identity: trimmed and lower-cased
pub fn normalize_identity(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// How much a failed login gives away, by consecutive failure count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintTier {
    None,
    /// First failure: the thematic clue
    Thematic,
    /// Second failure: the beginning of the phrase
    Partial,
    /// Third failure onward: the phrase itself
    Reveal,
}

impl HintTier {
    pub fn from_failures(count: u32) -> Self {
        match count {
            0 => HintTier::None,
            1 => HintTier::Thematic,
            2 => HintTier::Partial,
            _ => HintTier::Reveal,
        }
    }

    /// Hint text for a known identity
    pub fn hint_for(self, seed: &UserSeed) -> Option<String> {
        let text = match self {
            HintTier::None => return None,
            HintTier::Thematic => &seed.hints[0],
            HintTier::Partial => &seed.hints[1],
            HintTier::Reveal => &seed.secret,
        };

        if text.is_empty() {
            None
        } else {
            Some(text.clone())
        }
    }
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Result of one login attempt
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Success(User),
    Failed {
        /// Consecutive failures for this identity in this session
        attempts: u32,
        hint: Option<String>,
        /// Whether the identity is one of the two accounts
        known: bool,
    },
}

/// Public profile of the logged-in user
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub username: String,
    pub favorite_color: String,
    pub visit_count: i64,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    /// The other account, letters go there
    pub partner: Option<String>,
}
