/// Session and access-gate middleware
use crate::{
    access::LOCK_PATH,
    context::AppContext,
    error::LuneError,
    session::{SessionData, SessionId, SESSION_COOKIE},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;

/// Paths that never need a session; health checks must not mint one
fn sessionless(path: &str) -> bool {
    path == "/health" || path.starts_with("/health/") || path.starts_with("/static/")
}

/// Resolve the session cookie and refresh its last-seen time.
///
/// A request without a live session gets a fresh id and default data, but
/// nothing is stored and no cookie is sent unless a handler writes to it.
pub async fn load_session(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, LuneError> {
    if sessionless(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let now = ctx.clock.now();
    let max_idle = Duration::days(ctx.config.session.idle_days);

    let existing = match jar.get(SESSION_COOKIE) {
        Some(cookie) => {
            let id = cookie.value().to_string();
            match ctx.sessions.load(&id).await? {
                Some(data) if data.touched_at >= now - max_idle => {
                    let data = ctx
                        .sessions
                        .update(&id, now, Box::new(move |d| d.touched_at = now))
                        .await?;
                    Some((SessionId(id), data))
                }
                Some(_) => {
                    ctx.sessions.remove(&id).await?;
                    None
                }
                None => None,
            }
        }
        None => None,
    };

    let (id, data, stored) = match existing {
        Some((id, data)) => (id, data, true),
        None => (SessionId::generate(), SessionData::new(now), false),
    };

    req.extensions_mut().insert(id.clone());
    req.extensions_mut().insert(data);

    let response = next.run(req).await;

    if !stored && ctx.sessions.load(id.as_str()).await?.is_none() {
        return Ok(response);
    }

    if !stored {
        tracing::debug!("Started new session");
    }

    let cookie = Cookie::build((SESSION_COOKIE, id.0))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(ctx.config.session.cookie_secure)
        .build();

    Ok((jar.add(cookie), response).into_response())
}

/// Redirect protected requests to the lock page until the unlock instant,
/// unless the session holds an override.
pub async fn enforce_access_gate(
    State(ctx): State<AppContext>,
    req: Request,
    next: Next,
) -> Response {
    let has_override = req
        .extensions()
        .get::<SessionData>()
        .map(|data| data.unlock_override)
        .unwrap_or(false);

    if !ctx.gate.permits(req.uri().path(), has_override) {
        tracing::debug!("Locked: redirecting {}", req.uri().path());
        return Redirect::to(LOCK_PATH).into_response();
    }

    next.run(req).await
}
