/// Application context and dependency injection
use crate::{
    access::AccessGate,
    activity::ActivityLog,
    account::AccountManager,
    blob_store::{self, BlobBackend, PhotoStore},
    clock::{Clock, SystemClock},
    config::{BlobstoreConfig, DatabaseConfig, ServerConfig},
    db::{self, Repositories},
    error::{LuneError, LuneResult},
    mood::{MoodService, VerseCatalog},
    rate_limit::RateLimiter,
    session::{MemorySessionStore, SessionStore},
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub repos: Repositories,
    pub sessions: Arc<dyn SessionStore>,
    pub gate: Arc<AccessGate>,
    pub accounts: Arc<AccountManager>,
    pub moods: Arc<MoodService>,
    pub photos: Arc<PhotoStore>,
    pub activity: Arc<ActivityLog>,
    pub rate_limiter: Arc<RateLimiter>,
    pub clock: Arc<dyn Clock>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> LuneResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        let repos = db::connect(&config.storage.database).await?;
        let backend = blob_store::create_backend(&config.storage.blobstore)?;
        let catalog = VerseCatalog::load(&config.mood.catalog_path).await?;

        let ctx = Self::from_parts(
            config,
            repos,
            backend,
            catalog,
            Arc::new(MemorySessionStore::new()),
            Arc::new(SystemClock),
        );

        ctx.accounts.seed_users().await?;

        Ok(ctx)
    }

    /// Wire the services around already-built infrastructure
    pub fn from_parts(
        config: ServerConfig,
        repos: Repositories,
        backend: Arc<dyn BlobBackend>,
        catalog: VerseCatalog,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);

        let gate = Arc::new(AccessGate::new(&config.access, clock.clone()));
        let accounts = Arc::new(AccountManager::new(
            repos.users.clone(),
            config.clone(),
            clock.clone(),
        ));
        let moods = Arc::new(MoodService::new(
            Arc::new(catalog),
            repos.moods.clone(),
            config.mood.window_days,
            clock.clone(),
        ));
        let photos = Arc::new(PhotoStore::new(
            backend,
            repos.photos.clone(),
            config.service.upload_limit,
            clock.clone(),
        ));
        let activity = Arc::new(ActivityLog::new(repos.activity.clone(), clock.clone()));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Self {
            config,
            repos,
            sessions,
            gate,
            accounts,
            moods,
            photos,
            activity,
            rate_limiter,
            clock,
            started_at: std::time::Instant::now(),
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> LuneResult<()> {
        let mut dirs = vec![&config.storage.data_directory];

        if let DatabaseConfig::Sqlite { path } = &config.storage.database {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        if let BlobstoreConfig::Disk { location } = &config.storage.blobstore {
            dirs.push(location);
        }

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    LuneError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        match &self.config.service.public_url {
            Some(url) => url.clone(),
            None => format!(
                "http://{}:{}",
                self.config.service.hostname, self.config.service.port
            ),
        }
    }
}
