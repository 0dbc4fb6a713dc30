/// Photo gallery
use crate::{
    activity,
    api::{Listing, PageQuery},
    auth::AuthUser,
    blob_store::PhotoContent,
    context::AppContext,
    db::models::Photo,
    error::{LuneError, LuneResult},
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    routing::{delete, get, post},
    Router,
};

/// Multipart framing overhead allowed on top of the file itself
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn routes(upload_limit: usize) -> Router<AppContext> {
    Router::new()
        .route(
            "/photos",
            get(list_photos)
                .post(upload_photo)
                .layer(DefaultBodyLimit::max(upload_limit + FORM_OVERHEAD)),
        )
        .route("/photos/:id", delete(delete_photo))
        .route("/photos/:id/raw", get(photo_raw))
        .route("/photos/:id/like", post(like_photo))
}

async fn list_photos(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> LuneResult<Json<Listing<Photo>>> {
    let photos = ctx.repos.photos.list_photos(query.page_request()).await?;
    Ok(Json(photos.into()))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> LuneError {
    LuneError::Validation(format!("Invalid upload: {}", e.body_text()))
}

async fn upload_photo(
    State(ctx): State<AppContext>,
    user: AuthUser,
    mut multipart: Multipart,
) -> LuneResult<(StatusCode, Json<Photo>)> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut caption = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, data.to_vec()));
            }
            Some("caption") => {
                caption = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (filename, data) = file
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| LuneError::Validation("No file selected".to_string()))?;

    let photo = ctx
        .photos
        .upload(&user.username, &filename, caption, data)
        .await?;

    ctx.activity
        .record(&user.username, activity::PHOTO_UPLOADED, Some(photo.storage_key.clone()))
        .await;

    Ok((StatusCode::CREATED, Json(photo)))
}

async fn photo_raw(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> LuneResult<Response> {
    let (photo, content) = ctx
        .photos
        .open(id)
        .await?
        .ok_or_else(|| LuneError::NotFound(format!("Photo {} not found", id)))?;

    Ok(match content {
        PhotoContent::Redirect(url) => Redirect::temporary(&url).into_response(),
        PhotoContent::Bytes(bytes) => (
            [
                (header::CONTENT_TYPE, photo.mime_type),
                (header::CACHE_CONTROL, "private, max-age=86400".to_string()),
            ],
            bytes,
        )
            .into_response(),
    })
}

async fn like_photo(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> LuneResult<Json<Photo>> {
    let photo = ctx
        .repos
        .photos
        .like_photo(id)
        .await?
        .ok_or_else(|| LuneError::NotFound(format!("Photo {} not found", id)))?;

    Ok(Json(photo))
}

async fn delete_photo(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> LuneResult<StatusCode> {
    if !ctx.photos.delete(id).await? {
        return Err(LuneError::NotFound(format!("Photo {} not found", id)));
    }

    tracing::info!("{} deleted photo {}", user.username, id);
    Ok(StatusCode::NO_CONTENT)
}
