/// Session storage port and in-memory adapter
use crate::{error::LuneResult, session::SessionData};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-place change applied under the store's lock
pub type SessionUpdate = Box<dyn FnOnce(&mut SessionData) + Send>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> LuneResult<Option<SessionData>>;

    /// Apply `change` to the stored session, creating it (touched at `now`)
    /// when absent, and return the result. Fields the change leaves alone
    /// keep whatever concurrent requests wrote.
    async fn update(&self, id: &str, now: DateTime<Utc>, change: SessionUpdate)
        -> LuneResult<SessionData>;

    async fn remove(&self, id: &str) -> LuneResult<()>;

    /// Drop sessions untouched since `now - max_idle`; returns how many went
    async fn purge_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> LuneResult<u64>;
}

/// Process-local session store. Sessions do not survive a restart.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> LuneResult<Option<SessionData>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).cloned())
    }

    async fn update(
        &self,
        id: &str,
        now: DateTime<Utc>,
        change: SessionUpdate,
    ) -> LuneResult<SessionData> {
        let mut sessions = self.sessions.write().await;
        let data = sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionData::new(now));
        change(data);
        Ok(data.clone())
    }

    async fn remove(&self, id: &str) -> LuneResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        Ok(())
    }

    async fn purge_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> LuneResult<u64> {
        let cutoff = now - max_idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, data| data.touched_at >= cutoff);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(days_ago: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap() - Duration::days(days_ago)
    }

    #[tokio::test]
    async fn test_update_creates_and_loads() {
        let store = MemorySessionStore::new();
        assert!(store.load("abc").await.unwrap().is_none());

        let data = store
            .update("abc", at(0), Box::new(|d| d.user = Some("said".to_string())))
            .await
            .unwrap();
        assert_eq!(data.user.as_deref(), Some("said"));
        assert_eq!(data.touched_at, at(0));

        let loaded = store.load("abc").await.unwrap().unwrap();
        assert_eq!(loaded.user.as_deref(), Some("said"));
        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_updates_touch_only_their_fields() {
        let store = MemorySessionStore::new();
        store
            .update("abc", at(0), Box::new(|d| d.unlock_override = true))
            .await
            .unwrap();

        // A later change to another field leaves the override in place
        let data = store
            .update("abc", at(0), Box::new(|d| d.user = Some("fanta".to_string())))
            .await
            .unwrap();
        assert!(data.unlock_override);
        assert_eq!(data.user.as_deref(), Some("fanta"));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemorySessionStore::new();
        store.update("abc", at(0), Box::new(|_| {})).await.unwrap();
        store.remove("abc").await.unwrap();
        assert!(store.load("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_idle() {
        let store = MemorySessionStore::new();

        store.update("old", at(8), Box::new(|_| {})).await.unwrap();
        store.update("fresh", at(1), Box::new(|_| {})).await.unwrap();

        let purged = store.purge_idle(at(0), Duration::days(7)).await.unwrap();
        assert_eq!(purged, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.load("fresh").await.unwrap().is_some());
    }
}
