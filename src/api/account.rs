/// Login, logout, the lock page and the current profile
use crate::{
    access::LockStatus,
    activity,
    account::{LoginOutcome, LoginRequest, Profile},
    auth::{AuthUser, CurrentSession},
    context::AppContext,
    error::{LuneError, LuneResult},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/login", get(login_status).post(login))
        .route("/logout", post(logout))
        .route("/locked", get(locked))
        .route("/unlock", post(unlock))
        .route("/me", get(me))
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub favorite_color: String,
    pub visit_count: i64,
}

/// 401 body for a failed login; carries the hint for known identities
#[derive(Debug, Serialize)]
pub struct LoginFailure {
    pub error: String,
    pub message: String,
    pub hint: Option<String>,
    pub attempts: u32,
}

#[derive(Debug, Serialize)]
pub struct LoginStatus {
    pub logged_in_as: Option<String>,
    pub identity: Option<String>,
    pub attempts: u32,
    pub hint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub name: String,
    pub secret: String,
}

async fn login(
    State(ctx): State<AppContext>,
    mut session: CurrentSession,
    Json(req): Json<LoginRequest>,
) -> LuneResult<Response> {
    let mut attempts = session.data.attempts.clone();
    let outcome = ctx
        .accounts
        .login(&mut attempts, &req.username, &req.password)
        .await?;

    match outcome {
        LoginOutcome::Success(user) => {
            let username = user.username.clone();
            session
                .update(&ctx, move |data| {
                    data.attempts = attempts;
                    data.user = Some(username);
                })
                .await?;
            ctx.activity.record(&user.username, activity::LOGIN, None).await;

            Ok(Json(LoginResponse {
                username: user.username,
                favorite_color: user.favorite_color,
                visit_count: user.visit_count,
            })
            .into_response())
        }
        LoginOutcome::Failed {
            attempts: count,
            hint,
            known,
        } => {
            session.update(&ctx, move |data| data.attempts = attempts).await?;

            let message = if known {
                "Incorrect password"
            } else {
                "Incorrect username or password"
            };

            Ok((
                StatusCode::UNAUTHORIZED,
                Json(LoginFailure {
                    error: "InvalidCredentials".to_string(),
                    message: message.to_string(),
                    hint,
                    attempts: count,
                }),
            )
                .into_response())
        }
    }
}

async fn login_status(
    State(ctx): State<AppContext>,
    session: CurrentSession,
) -> Json<LoginStatus> {
    let attempts = &session.data.attempts;
    let identity = attempts.last_identity().map(str::to_string);

    Json(LoginStatus {
        logged_in_as: session.data.user.clone(),
        attempts: identity.as_deref().map(|i| attempts.count(i)).unwrap_or(0),
        hint: ctx.accounts.pending_hint(attempts),
        identity,
    })
}

/// Drops the identity and the failure counters; the unlock override stays
async fn logout(
    State(ctx): State<AppContext>,
    mut session: CurrentSession,
) -> LuneResult<Json<serde_json::Value>> {
    if let Some(user) = &session.data.user {
        tracing::info!("{} logged out", user);
    }

    if session.is_stored(&ctx).await? {
        session
            .update(&ctx, |data| {
                data.user = None;
                data.attempts.clear();
            })
            .await?;
    }

    Ok(Json(serde_json::json!({ "status": "logged_out" })))
}

async fn locked(State(ctx): State<AppContext>, session: CurrentSession) -> Json<LockStatus> {
    Json(ctx.gate.status(session.data.unlock_override))
}

async fn unlock(
    State(ctx): State<AppContext>,
    mut session: CurrentSession,
    Json(req): Json<UnlockRequest>,
) -> LuneResult<Json<LockStatus>> {
    if !ctx.gate.verify_override(&req.name, &req.secret) {
        tracing::warn!("Rejected unlock attempt");
        return Err(LuneError::Authentication(
            "Incorrect name or secret".to_string(),
        ));
    }

    session.update(&ctx, |data| data.unlock_override = true).await?;
    tracing::info!("Unlock override granted");

    Ok(Json(ctx.gate.status(true)))
}

async fn me(State(ctx): State<AppContext>, user: AuthUser) -> LuneResult<Json<Profile>> {
    Ok(Json(ctx.accounts.profile(&user.username).await?))
}
