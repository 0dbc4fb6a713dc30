/// SQLite adapter for every repository port
use crate::{
    db::{
        escape_like, models::*, ActivityRepository, HealthCheck, LetterRepository,
        MemoryRepository, MoodHistoryRepository, PhotoRepository, PhraseRepository,
        UserRepository,
    },
    error::{LuneError, LuneResult},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

const USER_COLUMNS: &str =
    "id, username, password_hash, favorite_color, visit_count, last_login, created_at";
const MOOD_COLUMNS: &str = "id, username, mood, date, verse_shown";
const PHRASE_COLUMNS: &str =
    "id, text, author, created_at, color, tags, is_favorite, likes, is_special";
const PHOTO_COLUMNS: &str =
    "id, storage_key, url, caption, author, mime_type, file_size, likes, created_at";
const LETTER_COLUMNS: &str = "id, title, content, sender, recipient, is_read, created_at";
const MEMORY_COLUMNS: &str =
    "id, title, description, date_memory, author, is_anniversary, created_at";
const ACTIVITY_COLUMNS: &str = "id, username, action, details, created_at";

/// `?1` is the tag with `LIKE` wildcards escaped
const PHRASE_FILTER: &str =
    "(?1 IS NULL OR (',' || tags || ',') LIKE '%,' || ?1 || ',%' ESCAPE '\\')
     AND (NOT ?2 OR is_favorite)";

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn find_user(&self, username: &str) -> LuneResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        favorite_color: &str,
        now: DateTime<Utc>,
    ) -> LuneResult<User> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, favorite_color, visit_count, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(password_hash)
            .bind(favorite_color)
            .bind(now)
            .fetch_one(&self.db)
            .await?;

        Ok(user)
    }

    async fn update_password_hash(&self, username: &str, password_hash: &str) -> LuneResult<()> {
        sqlx::query("UPDATE users SET password_hash = ?1 WHERE username = ?2")
            .bind(password_hash)
            .bind(username)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn record_login(&self, username: &str, at: DateTime<Utc>) -> LuneResult<()> {
        let result = sqlx::query(
            "UPDATE users SET visit_count = visit_count + 1, last_login = ?1 WHERE username = ?2",
        )
        .bind(at)
        .bind(username)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LuneError::NotFound(format!("User {} not found", username)));
        }

        Ok(())
    }

    async fn list_users(&self) -> LuneResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.db).await?;
        Ok(users)
    }
}

#[async_trait]
impl MoodHistoryRepository for SqliteStore {
    async fn append_mood(&self, entry: NewMoodEntry) -> LuneResult<MoodEntry> {
        let sql = format!(
            "INSERT INTO mood_entries (username, mood, date, verse_shown)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {}",
            MOOD_COLUMNS
        );
        let entry = sqlx::query_as::<_, MoodEntry>(&sql)
            .bind(&entry.username)
            .bind(&entry.mood)
            .bind(entry.date)
            .bind(&entry.verse_shown)
            .fetch_one(&self.db)
            .await?;

        Ok(entry)
    }

    async fn shown_since(&self, username: &str, since: NaiveDate) -> LuneResult<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT verse_shown FROM mood_entries WHERE username = ?1 AND date >= ?2",
        )
        .bind(username)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(keys)
    }

    async fn recent_moods(&self, username: &str, limit: i64) -> LuneResult<Vec<MoodEntry>> {
        let sql = format!(
            "SELECT {} FROM mood_entries WHERE username = ?1
             ORDER BY date DESC, id DESC LIMIT ?2",
            MOOD_COLUMNS
        );
        let entries = sqlx::query_as::<_, MoodEntry>(&sql)
            .bind(username)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        Ok(entries)
    }
}

#[async_trait]
impl PhraseRepository for SqliteStore {
    async fn create_phrase(&self, phrase: NewPhrase, now: DateTime<Utc>) -> LuneResult<Phrase> {
        let sql = format!(
            "INSERT INTO phrases (text, author, created_at, color, tags, is_favorite, likes, is_special)
             VALUES (?1, ?2, ?3, ?4, ?5, FALSE, 0, ?6)
             RETURNING {}",
            PHRASE_COLUMNS
        );
        let phrase = sqlx::query_as::<_, Phrase>(&sql)
            .bind(&phrase.text)
            .bind(&phrase.author)
            .bind(now)
            .bind(&phrase.color)
            .bind(&phrase.tags)
            .bind(phrase.is_special)
            .fetch_one(&self.db)
            .await?;

        Ok(phrase)
    }

    async fn list_phrases(&self, filter: &PhraseFilter, page: PageRequest) -> LuneResult<Page<Phrase>> {
        let tag = filter.tag.as_deref().map(escape_like);

        let count_sql = format!("SELECT COUNT(*) FROM phrases WHERE {}", PHRASE_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&tag)
            .bind(filter.favorites_only)
            .fetch_one(&self.db)
            .await?;

        let sql = format!(
            "SELECT {} FROM phrases WHERE {}
             ORDER BY created_at DESC, id DESC LIMIT ?3 OFFSET ?4",
            PHRASE_COLUMNS, PHRASE_FILTER
        );
        let items = sqlx::query_as::<_, Phrase>(&sql)
            .bind(&tag)
            .bind(filter.favorites_only)
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;

        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn toggle_favorite(&self, id: i64) -> LuneResult<Option<Phrase>> {
        let sql = format!(
            "UPDATE phrases SET is_favorite = NOT is_favorite WHERE id = ?1 RETURNING {}",
            PHRASE_COLUMNS
        );
        let phrase = sqlx::query_as::<_, Phrase>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(phrase)
    }

    async fn like_phrase(&self, id: i64) -> LuneResult<Option<Phrase>> {
        let sql = format!(
            "UPDATE phrases SET likes = likes + 1 WHERE id = ?1 RETURNING {}",
            PHRASE_COLUMNS
        );
        let phrase = sqlx::query_as::<_, Phrase>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(phrase)
    }

    async fn delete_phrase(&self, id: i64) -> LuneResult<bool> {
        let result = sqlx::query("DELETE FROM phrases WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PhotoRepository for SqliteStore {
    async fn create_photo(&self, photo: NewPhoto, now: DateTime<Utc>) -> LuneResult<Photo> {
        let sql = format!(
            "INSERT INTO photos (storage_key, url, caption, author, mime_type, file_size, likes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)
             RETURNING {}",
            PHOTO_COLUMNS
        );
        let photo = sqlx::query_as::<_, Photo>(&sql)
            .bind(&photo.storage_key)
            .bind(&photo.url)
            .bind(&photo.caption)
            .bind(&photo.author)
            .bind(&photo.mime_type)
            .bind(photo.file_size)
            .bind(now)
            .fetch_one(&self.db)
            .await?;

        Ok(photo)
    }

    async fn list_photos(&self, page: PageRequest) -> LuneResult<Page<Photo>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photos")
            .fetch_one(&self.db)
            .await?;

        let sql = format!(
            "SELECT {} FROM photos ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            PHOTO_COLUMNS
        );
        let items = sqlx::query_as::<_, Photo>(&sql)
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;

        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn get_photo(&self, id: i64) -> LuneResult<Option<Photo>> {
        let sql = format!("SELECT {} FROM photos WHERE id = ?1", PHOTO_COLUMNS);
        let photo = sqlx::query_as::<_, Photo>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(photo)
    }

    async fn like_photo(&self, id: i64) -> LuneResult<Option<Photo>> {
        let sql = format!(
            "UPDATE photos SET likes = likes + 1 WHERE id = ?1 RETURNING {}",
            PHOTO_COLUMNS
        );
        let photo = sqlx::query_as::<_, Photo>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(photo)
    }

    async fn delete_photo(&self, id: i64) -> LuneResult<Option<Photo>> {
        let sql = format!("DELETE FROM photos WHERE id = ?1 RETURNING {}", PHOTO_COLUMNS);
        let photo = sqlx::query_as::<_, Photo>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(photo)
    }
}

#[async_trait]
impl LetterRepository for SqliteStore {
    async fn create_letter(&self, letter: NewLetter, now: DateTime<Utc>) -> LuneResult<Letter> {
        let sql = format!(
            "INSERT INTO letters (title, content, sender, recipient, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, FALSE, ?5)
             RETURNING {}",
            LETTER_COLUMNS
        );
        let letter = sqlx::query_as::<_, Letter>(&sql)
            .bind(&letter.title)
            .bind(&letter.content)
            .bind(&letter.sender)
            .bind(&letter.recipient)
            .bind(now)
            .fetch_one(&self.db)
            .await?;

        Ok(letter)
    }

    async fn inbox(&self, recipient: &str) -> LuneResult<Vec<Letter>> {
        let sql = format!(
            "SELECT {} FROM letters WHERE recipient = ?1 ORDER BY created_at DESC, id DESC",
            LETTER_COLUMNS
        );
        let letters = sqlx::query_as::<_, Letter>(&sql)
            .bind(recipient)
            .fetch_all(&self.db)
            .await?;

        Ok(letters)
    }

    async fn sent(&self, sender: &str) -> LuneResult<Vec<Letter>> {
        let sql = format!(
            "SELECT {} FROM letters WHERE sender = ?1 ORDER BY created_at DESC, id DESC",
            LETTER_COLUMNS
        );
        let letters = sqlx::query_as::<_, Letter>(&sql)
            .bind(sender)
            .fetch_all(&self.db)
            .await?;

        Ok(letters)
    }

    async fn mark_read(&self, id: i64, recipient: &str) -> LuneResult<Option<Letter>> {
        let sql = format!(
            "UPDATE letters SET is_read = TRUE WHERE id = ?1 AND recipient = ?2 RETURNING {}",
            LETTER_COLUMNS
        );
        let letter = sqlx::query_as::<_, Letter>(&sql)
            .bind(id)
            .bind(recipient)
            .fetch_optional(&self.db)
            .await?;

        Ok(letter)
    }
}

#[async_trait]
impl MemoryRepository for SqliteStore {
    async fn create_memory(&self, memory: NewMemory, now: DateTime<Utc>) -> LuneResult<Memory> {
        let sql = format!(
            "INSERT INTO memories (title, description, date_memory, author, is_anniversary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {}",
            MEMORY_COLUMNS
        );
        let memory = sqlx::query_as::<_, Memory>(&sql)
            .bind(&memory.title)
            .bind(&memory.description)
            .bind(memory.date_memory)
            .bind(&memory.author)
            .bind(memory.is_anniversary)
            .bind(now)
            .fetch_one(&self.db)
            .await?;

        Ok(memory)
    }

    async fn list_memories(&self) -> LuneResult<Vec<Memory>> {
        let sql = format!(
            "SELECT {} FROM memories ORDER BY date_memory DESC, id DESC",
            MEMORY_COLUMNS
        );
        let memories = sqlx::query_as::<_, Memory>(&sql).fetch_all(&self.db).await?;
        Ok(memories)
    }

    async fn calendar_memories(&self, start: NaiveDate, end: NaiveDate) -> LuneResult<Vec<Memory>> {
        let sql = format!(
            "SELECT {} FROM memories
             WHERE (date_memory >= ?1 AND date_memory < ?2) OR is_anniversary
             ORDER BY date_memory, id",
            MEMORY_COLUMNS
        );
        let memories = sqlx::query_as::<_, Memory>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await?;

        Ok(memories)
    }

    async fn delete_memory(&self, id: i64) -> LuneResult<bool> {
        let result = sqlx::query("DELETE FROM memories WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ActivityRepository for SqliteStore {
    async fn log_activity(&self, activity: NewActivity, now: DateTime<Utc>) -> LuneResult<Activity> {
        let sql = format!(
            "INSERT INTO activities (username, action, details, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {}",
            ACTIVITY_COLUMNS
        );
        let activity = sqlx::query_as::<_, Activity>(&sql)
            .bind(&activity.username)
            .bind(&activity.action)
            .bind(&activity.details)
            .bind(now)
            .fetch_one(&self.db)
            .await?;

        Ok(activity)
    }

    async fn recent_activity(&self, limit: i64) -> LuneResult<Vec<Activity>> {
        let sql = format!(
            "SELECT {} FROM activities ORDER BY created_at DESC, id DESC LIMIT ?1",
            ACTIVITY_COLUMNS
        );
        let activities = sqlx::query_as::<_, Activity>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        Ok(activities)
    }
}

#[async_trait]
impl HealthCheck for SqliteStore {
    async fn ping(&self) -> LuneResult<()> {
        crate::db::test_connection(&self.db).await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
