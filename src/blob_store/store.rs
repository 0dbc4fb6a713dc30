/// Photo store manager
///
/// Coordinates the blob backend with the photo metadata table
use crate::{
    blob_store::{upload, BlobBackend},
    clock::Clock,
    db::{
        models::{NewPhoto, Photo},
        PhotoRepository,
    },
    error::LuneResult,
};
use std::sync::Arc;
use tracing::{info, warn};

/// How to hand photo bytes to a client
#[derive(Debug)]
pub enum PhotoContent {
    /// Served by the backend itself
    Redirect(String),
    Bytes(Vec<u8>),
}

#[derive(Clone)]
pub struct PhotoStore {
    backend: Arc<dyn BlobBackend>,
    photos: Arc<dyn PhotoRepository>,
    max_size: usize,
    clock: Arc<dyn Clock>,
}

impl PhotoStore {
    pub fn new(
        backend: Arc<dyn BlobBackend>,
        photos: Arc<dyn PhotoRepository>,
        max_size: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            photos,
            max_size,
            clock,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Validate, store and record an uploaded photo
    pub async fn upload(
        &self,
        author: &str,
        filename: &str,
        caption: Option<String>,
        data: Vec<u8>,
    ) -> LuneResult<Photo> {
        let mime_type = upload::validate_upload(filename, &data, self.max_size)?;

        let now = self.clock.now();
        let key = upload::storage_key(now, filename);
        let file_size = data.len() as i64;

        let stored = self.backend.put(&key, data, mime_type).await?;

        let caption = caption
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let photo = match self
            .photos
            .create_photo(
                NewPhoto {
                    storage_key: key.clone(),
                    url: stored.url,
                    caption,
                    author: author.to_string(),
                    mime_type: mime_type.to_string(),
                    file_size,
                },
                now,
            )
            .await
        {
            Ok(photo) => photo,
            Err(e) => {
                // Do not leave an unreferenced blob behind
                if let Err(cleanup) = self.backend.delete(&key).await {
                    warn!("Failed to remove orphaned blob {}: {}", key, cleanup);
                }
                return Err(e);
            }
        };

        info!(
            "Stored photo {} ({} bytes) on {}",
            photo.id,
            file_size,
            self.backend.backend_name()
        );
        Ok(photo)
    }

    /// Photo metadata plus a way to fetch its bytes
    pub async fn open(&self, id: i64) -> LuneResult<Option<(Photo, PhotoContent)>> {
        let Some(photo) = self.photos.get_photo(id).await? else {
            return Ok(None);
        };

        if let Some(url) = photo.url.clone() {
            return Ok(Some((photo, PhotoContent::Redirect(url))));
        }

        match self.backend.get(&photo.storage_key).await? {
            Some(bytes) => Ok(Some((photo, PhotoContent::Bytes(bytes)))),
            None => {
                warn!("Photo {} has no blob under {}", photo.id, photo.storage_key);
                Ok(None)
            }
        }
    }

    /// Remove the photo row and its blob. Returns false if no such photo.
    pub async fn delete(&self, id: i64) -> LuneResult<bool> {
        let Some(photo) = self.photos.delete_photo(id).await? else {
            return Ok(false);
        };

        if let Err(e) = self.backend.delete(&photo.storage_key).await {
            warn!("Failed to delete blob {}: {}", photo.storage_key, e);
        }

        Ok(true)
    }
}
