/// Activity log
///
/// Content handlers record what each user did. Recording never fails the
/// request; a storage error is logged and dropped.
use crate::{
    clock::Clock,
    db::{
        models::{Activity, NewActivity},
        ActivityRepository,
    },
    error::LuneResult,
};
use std::sync::Arc;
use tracing::warn;

pub const LOGIN: &str = "login";
pub const PHRASE_ADDED: &str = "phrase_added";
pub const PHOTO_UPLOADED: &str = "photo_uploaded";
pub const LETTER_SENT: &str = "letter_sent";
pub const MEMORY_ADDED: &str = "memory_added";
pub const MOOD_CHECKED: &str = "mood_checked";

pub struct ActivityLog {
    repo: Arc<dyn ActivityRepository>,
    clock: Arc<dyn Clock>,
}

impl ActivityLog {
    pub fn new(repo: Arc<dyn ActivityRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn record(&self, username: &str, action: &str, details: Option<String>) {
        let activity = NewActivity {
            username: username.to_string(),
            action: action.to_string(),
            details,
        };

        if let Err(e) = self.repo.log_activity(activity, self.clock.now()).await {
            warn!("Failed to record {} for {}: {}", action, username, e);
        }
    }

    pub async fn recent(&self, limit: i64) -> LuneResult<Vec<Activity>> {
        self.repo.recent_activity(limit).await
    }
}
