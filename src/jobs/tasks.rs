/// Background task implementations
use crate::{
    context::AppContext,
    error::{LuneError, LuneResult},
};
use chrono::Duration;

/// Drop sessions idle longer than the configured lifetime
pub async fn cleanup_idle_sessions(ctx: &AppContext) -> LuneResult<u64> {
    let max_idle = Duration::days(ctx.config.session.idle_days);
    ctx.sessions.purge_idle(ctx.clock.now(), max_idle).await
}

/// Health check - verify the database answers
pub async fn health_check(ctx: &AppContext) -> LuneResult<()> {
    ctx.repos.health.ping().await
}

/// GET `<base>/health`; any non-2xx answer is an error
pub async fn keepalive_ping(client: &reqwest::Client, base: &str) -> LuneResult<reqwest::StatusCode> {
    let url = format!("{}/health", base.trim_end_matches('/'));

    let response = client
        .get(&url)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| LuneError::Internal(format!("Keepalive request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LuneError::Internal(format!(
            "Keepalive got {} from {}",
            status, url
        )));
    }

    Ok(status)
}
