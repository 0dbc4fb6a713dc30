/// Recent activity feed
use crate::{auth::AuthUser, context::AppContext, db::models::Activity, error::LuneResult};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/activity", get(recent_activity))
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

async fn recent_activity(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Query(query): Query<ActivityQuery>,
) -> LuneResult<Json<Vec<Activity>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok(Json(ctx.activity.recent(limit).await?))
}
