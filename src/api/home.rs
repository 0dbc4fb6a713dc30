/// Landing page data: who is logged in, the latest messages, unread letters
use crate::{
    account::Profile,
    api::Listing,
    auth::AuthUser,
    context::AppContext,
    db::models::{PageRequest, Phrase, PhraseFilter},
    error::LuneResult,
};
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/", get(home))
}

#[derive(Debug, Serialize)]
pub struct Home {
    pub profile: Profile,
    pub phrases: Listing<Phrase>,
    pub unread_letters: usize,
}

async fn home(State(ctx): State<AppContext>, user: AuthUser) -> LuneResult<Json<Home>> {
    let profile = ctx.accounts.profile(&user.username).await?;
    let phrases = ctx
        .repos
        .phrases
        .list_phrases(&PhraseFilter::default(), PageRequest::new(None, None))
        .await?;
    let unread_letters = ctx
        .repos
        .letters
        .inbox(&user.username)
        .await?
        .iter()
        .filter(|letter| !letter.is_read)
        .count();

    Ok(Json(Home {
        profile,
        phrases: phrases.into(),
        unread_letters,
    }))
}
