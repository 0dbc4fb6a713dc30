/// Mood verse service: catalog + history + selection policy
use crate::{
    clock::Clock,
    db::{
        models::{MoodEntry, NewMoodEntry},
        MoodHistoryRepository,
    },
    error::LuneResult,
    mood::{choose_verse, verse_key, MoodPick, Verse, VerseCatalog},
};
use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub struct MoodService {
    catalog: Arc<VerseCatalog>,
    history: Arc<dyn MoodHistoryRepository>,
    window_days: i64,
    clock: Arc<dyn Clock>,
}

impl MoodService {
    pub fn new(
        catalog: Arc<VerseCatalog>,
        history: Arc<dyn MoodHistoryRepository>,
        window_days: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            history,
            window_days,
            clock,
        }
    }

    pub fn categories(&self) -> Vec<&str> {
        self.catalog.categories()
    }

    /// Choose a verse for `username` in `mood` and journal it.
    ///
    /// Returns `None`, without touching the journal, when the category is
    /// unknown or empty.
    pub async fn pick(&self, username: &str, mood: &str) -> LuneResult<Option<Verse>> {
        let verses = self.catalog.verses(mood);
        if verses.is_empty() {
            debug!("No verses for mood {:?}", mood);
            return Ok(None);
        }

        let today = self.clock.today();
        let since = today - Duration::days(self.window_days);
        let recent: HashSet<String> = self
            .history
            .shown_since(username, since)
            .await?
            .into_iter()
            .collect();

        let chosen = {
            let mut rng = rand::thread_rng();
            choose_verse(verses, &recent, &mut rng).cloned()
        };

        let Some(verse) = chosen else {
            return Ok(None);
        };

        self.history
            .append_mood(NewMoodEntry {
                username: username.to_string(),
                mood: mood.to_string(),
                date: today,
                verse_shown: verse_key(&verse),
            })
            .await?;

        Ok(Some(verse))
    }

    /// Selection wrapped for the HTTP layer
    pub async fn respond(&self, username: &str, mood: &str) -> LuneResult<MoodPick> {
        let mood = mood.trim();
        let verse = self.pick(username, mood).await?;
        let notice = if verse.is_none() {
            Some("Aucun verset disponible pour cette humeur.".to_string())
        } else {
            None
        };

        Ok(MoodPick {
            mood: mood.to_string(),
            verse,
            notice,
        })
    }

    pub async fn recent(&self, username: &str, limit: i64) -> LuneResult<Vec<MoodEntry>> {
        self.history.recent_moods(username, limit).await
    }
}
