/// Photo storage
///
/// Photo bytes live in a blob backend (local disk or Cloudinary); their
/// metadata lives in the database. `PhotoStore` keeps the two in step.

pub mod cloudinary;
pub mod disk;
pub mod store;
pub mod upload;

pub use cloudinary::CloudinaryBackend;
pub use disk::DiskBlobBackend;
pub use store::{PhotoContent, PhotoStore};

use crate::{config::BlobstoreConfig, error::LuneResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Where a stored blob ended up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredBlob {
    /// Public URL when the backend serves the file itself
    pub url: Option<String>,
}

/// Blob storage backend trait
///
/// Keys are the sanitized, timestamped file names produced by
/// [`upload::storage_key`].
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store a blob under `key`
    async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> LuneResult<StoredBlob>;

    /// Retrieve a blob by key
    async fn get(&self, key: &str) -> LuneResult<Option<Vec<u8>>>;

    /// Delete a blob by key; deleting a missing blob is not an error
    async fn delete(&self, key: &str) -> LuneResult<()>;

    /// Check if a blob exists
    async fn exists(&self, key: &str) -> LuneResult<bool>;

    fn backend_name(&self) -> &'static str;
}

/// Build the configured backend
pub fn create_backend(config: &BlobstoreConfig) -> LuneResult<Arc<dyn BlobBackend>> {
    let backend: Arc<dyn BlobBackend> = match config {
        BlobstoreConfig::Disk { location } => {
            tracing::info!("Storing photos on disk at {:?}", location);
            Arc::new(DiskBlobBackend::new(location.clone()))
        }
        BlobstoreConfig::Cloudinary {
            cloud_name,
            api_key,
            api_secret,
            folder,
        } => {
            tracing::info!("Storing photos on Cloudinary ({}/{})", cloud_name, folder);
            Arc::new(CloudinaryBackend::new(
                cloud_name.clone(),
                api_key.clone(),
                api_secret.clone(),
                folder.clone(),
            )?)
        }
    };

    Ok(backend)
}
