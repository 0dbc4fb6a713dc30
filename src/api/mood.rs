/// Mood check-in
use crate::{
    activity,
    auth::AuthUser,
    context::AppContext,
    db::models::MoodEntry,
    error::LuneResult,
    mood::MoodPick,
};
use axum::{extract::State, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};

const RECENT_LIMIT: i64 = 10;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/mood", get(mood_page).post(pick_mood))
}

#[derive(Debug, Serialize)]
pub struct MoodPage {
    pub categories: Vec<String>,
    pub recent: Vec<MoodEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub mood: String,
}

async fn mood_page(State(ctx): State<AppContext>, user: AuthUser) -> LuneResult<Json<MoodPage>> {
    let recent = ctx.moods.recent(&user.username, RECENT_LIMIT).await?;

    Ok(Json(MoodPage {
        categories: ctx.moods.categories().into_iter().map(str::to_string).collect(),
        recent,
    }))
}

async fn pick_mood(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<MoodRequest>,
) -> LuneResult<Json<MoodPick>> {
    let pick = ctx.moods.respond(&user.username, &req.mood).await?;
    ctx.activity
        .record(&user.username, activity::MOOD_CHECKED, Some(pick.mood.clone()))
        .await;

    Ok(Json(pick))
}
