/// Rate limiting for the credential endpoints
use crate::{
    config::RateLimitConfig,
    error::{LuneError, LuneResult},
};
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Paths whose POSTs check a secret
const GUARDED_PATHS: &[&str] = &["/login", "/unlock"];

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    login: Option<Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        if !config.enabled {
            return Self { login: None };
        }

        let rps = NonZeroU32::new(config.login_rps).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rps).allow_burst(rps);

        Self {
            login: Some(Arc::new(GovernorLimiter::direct(quota))),
        }
    }

    /// Check rate limit for a login or unlock attempt
    pub fn check_login(&self) -> LuneResult<()> {
        let Some(limiter) = &self.login else {
            return Ok(());
        };

        match limiter.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(LuneError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.login.is_some()
    }
}

/// Rate limiting middleware for credential submissions
pub async fn login_rate_limit(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Response {
    let guarded =
        request.method() == Method::POST && GUARDED_PATHS.contains(&request.uri().path());

    if guarded {
        if let Err(e) = ctx.rate_limiter.check_login() {
            tracing::warn!("Rate limit hit on {}", request.uri().path());
            return e.into_response();
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_limit() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: true,
            login_rps: 3,
        });

        for _ in 0..3 {
            assert!(limiter.check_login().is_ok());
        }

        assert!(matches!(
            limiter.check_login(),
            Err(LuneError::RateLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_disabled_never_limits() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: false,
            login_rps: 1,
        });
        assert!(!limiter.is_enabled());

        for _ in 0..100 {
            assert!(limiter.check_login().is_ok());
        }
    }
}
