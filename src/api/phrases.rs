/// Love messages
use crate::{
    activity,
    api::Listing,
    auth::AuthUser,
    config::DEFAULT_COLOR,
    context::AppContext,
    db::models::{NewPhrase, PageRequest, Phrase, PhraseFilter},
    error::{LuneError, LuneResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use validator::{Validate, ValidationError};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/phrases", get(list_phrases).post(create_phrase))
        .route("/phrases/:id", axum::routing::delete(delete_phrase))
        .route("/phrases/:id/favorite", post(toggle_favorite))
        .route("/phrases/:id/like", post(like_phrase))
}

#[derive(Debug, Deserialize)]
pub struct ListPhrasesQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub tag: Option<String>,
    #[serde(default)]
    pub favorites: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePhraseRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    #[validate(custom(function = "validate_color"))]
    pub color: Option<String>,
    #[validate(length(max = 200))]
    pub tags: Option<String>,
    #[serde(default)]
    pub is_special: bool,
}

/// `#rgb` or `#rrggbb`
fn validate_color(color: &str) -> Result<(), ValidationError> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| ValidationError::new("color"))?;

    if (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new("color"))
    }
}

/// Comma-separated, trimmed, lower-cased, without empties or repeats
pub fn normalize_tags(raw: &str) -> Option<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',') {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if tags.is_empty() {
        None
    } else {
        Some(tags.join(","))
    }
}

async fn list_phrases(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Query(query): Query<ListPhrasesQuery>,
) -> LuneResult<Json<Listing<Phrase>>> {
    let filter = PhraseFilter {
        tag: query
            .tag
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty()),
        favorites_only: query.favorites,
    };
    let page = PageRequest::new(query.page, query.per_page);

    let phrases = ctx.repos.phrases.list_phrases(&filter, page).await?;
    Ok(Json(phrases.into()))
}

async fn create_phrase(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<CreatePhraseRequest>,
) -> LuneResult<(StatusCode, Json<Phrase>)> {
    req.validate()
        .map_err(|e| LuneError::Validation(e.to_string()))?;

    let text = req.text.trim();
    if text.is_empty() {
        return Err(LuneError::Validation("Message cannot be empty".to_string()));
    }

    let phrase = ctx
        .repos
        .phrases
        .create_phrase(
            NewPhrase {
                text: text.to_string(),
                author: user.username.clone(),
                color: req.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                tags: req.tags.as_deref().and_then(normalize_tags),
                is_special: req.is_special,
            },
            ctx.clock.now(),
        )
        .await?;

    tracing::info!("{} added phrase {}", user.username, phrase.id);
    ctx.activity
        .record(&user.username, activity::PHRASE_ADDED, Some(format!("phrase {}", phrase.id)))
        .await;
    Ok((StatusCode::CREATED, Json(phrase)))
}

async fn toggle_favorite(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> LuneResult<Json<Phrase>> {
    let phrase = ctx
        .repos
        .phrases
        .toggle_favorite(id)
        .await?
        .ok_or_else(|| LuneError::NotFound(format!("Phrase {} not found", id)))?;

    Ok(Json(phrase))
}

async fn like_phrase(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> LuneResult<Json<Phrase>> {
    let phrase = ctx
        .repos
        .phrases
        .like_phrase(id)
        .await?
        .ok_or_else(|| LuneError::NotFound(format!("Phrase {} not found", id)))?;

    Ok(Json(phrase))
}

async fn delete_phrase(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> LuneResult<StatusCode> {
    if !ctx.repos.phrases.delete_phrase(id).await? {
        return Err(LuneError::NotFound(format!("Phrase {} not found", id)));
    }

    tracing::info!("{} deleted phrase {}", user.username, id);
    Ok(StatusCode::NO_CONTENT)
}
