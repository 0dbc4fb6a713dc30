/// Letters between the two accounts
use crate::{
    activity,
    auth::AuthUser,
    context::AppContext,
    db::models::{Letter, NewLetter},
    error::{LuneError, LuneResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/letters", get(inbox).post(send_letter))
        .route("/letters/sent", get(sent))
        .route("/letters/:id/read", post(mark_read))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendLetterRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

async fn send_letter(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<SendLetterRequest>,
) -> LuneResult<(StatusCode, Json<Letter>)> {
    req.validate()
        .map_err(|e| LuneError::Validation(e.to_string()))?;

    let recipient = ctx
        .config
        .partner_of(&user.username)
        .map(|p| p.name.clone())
        .ok_or_else(|| LuneError::Validation("No recipient for this account".to_string()))?;

    let letter = ctx
        .repos
        .letters
        .create_letter(
            NewLetter {
                title: req.title.trim().to_string(),
                content: req.content,
                sender: user.username.clone(),
                recipient,
            },
            ctx.clock.now(),
        )
        .await?;

    tracing::info!("{} sent letter {}", user.username, letter.id);
    ctx.activity
        .record(&user.username, activity::LETTER_SENT, Some(letter.title.clone()))
        .await;
    Ok((StatusCode::CREATED, Json(letter)))
}

async fn inbox(State(ctx): State<AppContext>, user: AuthUser) -> LuneResult<Json<Vec<Letter>>> {
    Ok(Json(ctx.repos.letters.inbox(&user.username).await?))
}

async fn sent(State(ctx): State<AppContext>, user: AuthUser) -> LuneResult<Json<Vec<Letter>>> {
    Ok(Json(ctx.repos.letters.sent(&user.username).await?))
}

/// Only the recipient can mark a letter read
async fn mark_read(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> LuneResult<Json<Letter>> {
    let letter = ctx
        .repos
        .letters
        .mark_read(id, &user.username)
        .await?
        .ok_or_else(|| LuneError::NotFound(format!("Letter {} not found", id)))?;

    Ok(Json(letter))
}
