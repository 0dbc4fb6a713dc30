/// Shared memories and the calendar
use crate::{
    activity,
    auth::AuthUser,
    context::AppContext,
    db::models::{Memory, NewMemory},
    error::{LuneError, LuneResult},
    memories::{month_bounds, month_grid, MonthGrid},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/memories", get(list_memories).post(create_memory))
        .route("/memories/:id", delete(delete_memory))
        .route("/calendar", get(calendar))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemoryRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_anniversary: bool,
}

/// `?year=&month=`, defaulting to the current month
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

async fn list_memories(
    State(ctx): State<AppContext>,
    _user: AuthUser,
) -> LuneResult<Json<Vec<Memory>>> {
    Ok(Json(ctx.repos.memories.list_memories().await?))
}

async fn create_memory(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<CreateMemoryRequest>,
) -> LuneResult<(StatusCode, Json<Memory>)> {
    req.validate()
        .map_err(|e| LuneError::Validation(e.to_string()))?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(LuneError::Validation("Title cannot be empty".to_string()));
    }

    let memory = ctx
        .repos
        .memories
        .create_memory(
            NewMemory {
                title: title.to_string(),
                description: req.description.trim().to_string(),
                date_memory: req.date,
                author: user.username.clone(),
                is_anniversary: req.is_anniversary,
            },
            ctx.clock.now(),
        )
        .await?;

    ctx.activity
        .record(&user.username, activity::MEMORY_ADDED, Some(memory.title.clone()))
        .await;

    Ok((StatusCode::CREATED, Json(memory)))
}

async fn delete_memory(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> LuneResult<StatusCode> {
    if !ctx.repos.memories.delete_memory(id).await? {
        return Err(LuneError::NotFound(format!("Memory {} not found", id)));
    }

    tracing::info!("{} deleted memory {}", user.username, id);
    Ok(StatusCode::NO_CONTENT)
}

async fn calendar(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Query(query): Query<CalendarQuery>,
) -> LuneResult<Json<MonthGrid>> {
    let today = ctx.clock.today();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());

    let (start, end) = month_bounds(year, month)?;
    let memories = ctx.repos.memories.calendar_memories(start, end).await?;

    Ok(Json(month_grid(year, month, &memories, today)?))
}
