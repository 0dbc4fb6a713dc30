use std::sync::Arc;
use tokio::time::{interval, interval_at, Duration, Instant};
use tracing::{debug, error, info, warn};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
    http: reqwest::Client,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self {
            context,
            http: reqwest::Client::new(),
        }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::idle_session_cleanup_job(Arc::clone(&self)));
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        let keepalive = &self.context.config.keepalive;
        match (&self.context.config.service.public_url, keepalive.enabled) {
            (Some(url), true) => {
                info!("Keepalive enabled: {}/health every {}s", url, keepalive.interval_secs);
                tokio::spawn(Self::keepalive_job(Arc::clone(&self)));
            }
            (None, true) => warn!("Keepalive enabled but LUNE_PUBLIC_URL is not set"),
            _ => {}
        }

        info!("Background jobs started");
    }

    /// Purge idle sessions (runs every hour)
    async fn idle_session_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(3600)); // Every hour

        loop {
            interval.tick().await;

            match tasks::cleanup_idle_sessions(&scheduler.context).await {
                Ok(count) if count > 0 => info!("Purged {} idle sessions", count),
                Ok(_) => debug!("Session cleanup: nothing to purge"),
                Err(e) => error!("Failed to purge idle sessions: {}", e),
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300)); // Every 5 minutes

        loop {
            interval.tick().await;

            if let Err(e) = tasks::health_check(&scheduler.context).await {
                error!("Health check failed: {}", e);
            }
        }
    }

    /// Ping our own public URL so free-tier hosts do not idle the service out
    async fn keepalive_job(scheduler: Arc<Self>) {
        let Some(base) = scheduler.context.config.service.public_url.clone() else {
            return;
        };
        let period = Duration::from_secs(scheduler.context.config.keepalive.interval_secs.max(1));
        // First ping after one period, once the listener is up
        let mut interval = interval_at(Instant::now() + period, period);

        loop {
            interval.tick().await;

            match tasks::keepalive_ping(&scheduler.http, &base).await {
                Ok(status) => debug!("Keepalive ping: {}", status),
                Err(e) => error!("Keepalive ping failed: {}", e),
            }
        }
    }
}
