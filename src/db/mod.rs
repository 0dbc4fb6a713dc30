/// Database layer for Lune
///
/// The rest of the crate only sees the repository traits below. SQLite and
/// PostgreSQL adapters implement all of them and one is picked at startup.

pub mod models;
pub mod postgres;
pub mod sqlite;

use crate::{
    config::DatabaseConfig,
    error::{LuneError, LuneResult},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use models::*;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, username: &str) -> LuneResult<Option<User>>;

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        favorite_color: &str,
        now: DateTime<Utc>,
    ) -> LuneResult<User>;

    async fn update_password_hash(&self, username: &str, password_hash: &str) -> LuneResult<()>;

    /// Bump the visit counter and stamp the login time
    async fn record_login(&self, username: &str, at: DateTime<Utc>) -> LuneResult<()>;

    async fn list_users(&self) -> LuneResult<Vec<User>>;
}

#[async_trait]
pub trait MoodHistoryRepository: Send + Sync {
    async fn append_mood(&self, entry: NewMoodEntry) -> LuneResult<MoodEntry>;

    /// Verse keys shown to `username` on or after `since`
    async fn shown_since(&self, username: &str, since: NaiveDate) -> LuneResult<Vec<String>>;

    async fn recent_moods(&self, username: &str, limit: i64) -> LuneResult<Vec<MoodEntry>>;
}

#[async_trait]
pub trait PhraseRepository: Send + Sync {
    async fn create_phrase(&self, phrase: NewPhrase, now: DateTime<Utc>) -> LuneResult<Phrase>;

    async fn list_phrases(&self, filter: &PhraseFilter, page: PageRequest) -> LuneResult<Page<Phrase>>;

    async fn toggle_favorite(&self, id: i64) -> LuneResult<Option<Phrase>>;

    async fn like_phrase(&self, id: i64) -> LuneResult<Option<Phrase>>;

    async fn delete_phrase(&self, id: i64) -> LuneResult<bool>;
}

#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn create_photo(&self, photo: NewPhoto, now: DateTime<Utc>) -> LuneResult<Photo>;

    async fn list_photos(&self, page: PageRequest) -> LuneResult<Page<Photo>>;

    async fn get_photo(&self, id: i64) -> LuneResult<Option<Photo>>;

    async fn like_photo(&self, id: i64) -> LuneResult<Option<Photo>>;

    /// Remove the row and hand it back so the caller can drop the blob
    async fn delete_photo(&self, id: i64) -> LuneResult<Option<Photo>>;
}

#[async_trait]
pub trait LetterRepository: Send + Sync {
    async fn create_letter(&self, letter: NewLetter, now: DateTime<Utc>) -> LuneResult<Letter>;

    async fn inbox(&self, recipient: &str) -> LuneResult<Vec<Letter>>;

    async fn sent(&self, sender: &str) -> LuneResult<Vec<Letter>>;

    async fn mark_read(&self, id: i64, recipient: &str) -> LuneResult<Option<Letter>>;
}

#[async_trait]
pub trait MemoryRepository: Send + Sync {
    async fn create_memory(&self, memory: NewMemory, now: DateTime<Utc>) -> LuneResult<Memory>;

    /// Every memory, most recent date first
    async fn list_memories(&self) -> LuneResult<Vec<Memory>>;

    /// Memories dated in `[start, end)` plus every anniversary
    async fn calendar_memories(&self, start: NaiveDate, end: NaiveDate) -> LuneResult<Vec<Memory>>;

    async fn delete_memory(&self, id: i64) -> LuneResult<bool>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn log_activity(&self, activity: NewActivity, now: DateTime<Utc>) -> LuneResult<Activity>;

    async fn recent_activity(&self, limit: i64) -> LuneResult<Vec<Activity>>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> LuneResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Every repository port, backed by one adapter
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub moods: Arc<dyn MoodHistoryRepository>,
    pub phrases: Arc<dyn PhraseRepository>,
    pub photos: Arc<dyn PhotoRepository>,
    pub letters: Arc<dyn LetterRepository>,
    pub memories: Arc<dyn MemoryRepository>,
    pub activity: Arc<dyn ActivityRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + MoodHistoryRepository
            + PhraseRepository
            + PhotoRepository
            + LetterRepository
            + MemoryRepository
            + ActivityRepository
            + HealthCheck
            + 'static,
    {
        Self {
            users: store.clone(),
            moods: store.clone(),
            phrases: store.clone(),
            photos: store.clone(),
            letters: store.clone(),
            memories: store.clone(),
            activity: store.clone(),
            health: store,
        }
    }
}

/// Escape `LIKE` wildcards so a value only matches itself (escape char `\`)
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Open the configured backend and bring its schema up to date
pub async fn connect(config: &DatabaseConfig) -> LuneResult<Repositories> {
    match config {
        DatabaseConfig::Sqlite { path } => {
            tracing::info!("Using SQLite database at {:?}", path);
            let pool = create_pool(path, DatabaseOptions::default()).await?;
            run_migrations(&pool).await?;
            test_connection(&pool).await?;
            Ok(Repositories::from_store(Arc::new(SqliteStore::new(pool))))
        }
        DatabaseConfig::Postgres { url } => {
            tracing::info!("Using PostgreSQL database");
            let pool = postgres::create_pool(postgres::PostgresConfig::with_url(url.clone())).await?;
            postgres::run_migrations(&pool).await?;
            Ok(Repositories::from_store(Arc::new(PgStore::new(pool))))
        }
    }
}

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> LuneResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(if options.enable_wal {
                    sqlx::sqlite::SqliteJournalMode::Wal
                } else {
                    sqlx::sqlite::SqliteJournalMode::Delete
                })
                .foreign_keys(true)
                .busy_timeout(std::time::Duration::from_secs(5)),
        )
        .await?;

    Ok(pool)
}

/// Single-connection in-memory SQLite database with the schema applied
pub async fn create_memory_pool() -> LuneResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run migrations for a SQLite database
/// Migrations are embedded at compile time from ./migrations/sqlite
pub async fn run_migrations(pool: &SqlitePool) -> LuneResult<()> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| LuneError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> LuneResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}
