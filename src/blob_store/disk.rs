/// Disk-based blob storage backend
use crate::{
    blob_store::{BlobBackend, StoredBlob},
    error::{LuneError, LuneResult},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::{fs, io::AsyncWriteExt};

/// Disk storage backend
///
/// Stores photos on the local filesystem, sharded into one directory per
/// upload month so a long-lived album does not pile up in one folder.
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the file path for a key
    ///
    /// Uses directory sharding: {base}/{YYYYMM}/{key}
    /// For example, key "20251001_201500_lune.jpg" -> {base}/202510/20251001_201500_lune.jpg
    fn get_blob_path(&self, key: &str) -> LuneResult<PathBuf> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.starts_with('.')
        {
            return Err(LuneError::BlobStorage(format!("Invalid blob key: {:?}", key)));
        }

        let shard = key
            .get(0..6)
            .filter(|prefix| prefix.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or("_");
        Ok(self.base_path.join(shard).join(key))
    }

    /// Ensure the directory for a blob exists
    async fn ensure_blob_dir(&self, key: &str) -> LuneResult<PathBuf> {
        let blob_path = self.get_blob_path(key)?;
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                LuneError::BlobStorage(format!("Failed to create blob directory: {}", e))
            })?;
        }
        Ok(blob_path)
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn put(&self, key: &str, data: Vec<u8>, _mime_type: &str) -> LuneResult<StoredBlob> {
        let blob_path = self.ensure_blob_dir(key).await?;

        // Keys are never reused; an existing file belongs to another photo
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&blob_path)
            .await
            .map_err(|e| {
                LuneError::BlobStorage(format!("Failed to create blob {}: {}", key, e))
            })?;

        file.write_all(&data).await.map_err(|e| {
            LuneError::BlobStorage(format!("Failed to write blob {}: {}", key, e))
        })?;
        file.flush().await.map_err(|e| {
            LuneError::BlobStorage(format!("Failed to write blob {}: {}", key, e))
        })?;

        Ok(StoredBlob::default())
    }

    async fn get(&self, key: &str) -> LuneResult<Option<Vec<u8>>> {
        let blob_path = self.get_blob_path(key)?;

        match fs::read(&blob_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LuneError::BlobStorage(format!(
                "Failed to read blob {}: {}",
                key, e
            ))),
        }
    }

    async fn delete(&self, key: &str) -> LuneResult<()> {
        let blob_path = self.get_blob_path(key)?;

        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LuneError::BlobStorage(format!(
                "Failed to delete blob {}: {}",
                key, e
            ))),
        }
    }

    async fn exists(&self, key: &str) -> LuneResult<bool> {
        let blob_path = self.get_blob_path(key)?;
        Ok(fs::try_exists(&blob_path).await.unwrap_or(false))
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_get_blob() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        let key = "20251001_201500_lune.jpg";
        let data = b"test blob data".to_vec();

        let stored = backend.put(key, data.clone(), "image/jpeg").await.unwrap();
        assert_eq!(stored.url, None);

        let retrieved = backend.get(key).await.unwrap();
        assert_eq!(retrieved, Some(data));
    }

    #[tokio::test]
    async fn test_put_never_overwrites() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        let key = "20251001_201500_lune.jpg";
        backend.put(key, b"first".to_vec(), "image/jpeg").await.unwrap();

        let result = backend.put(key, b"second".to_vec(), "image/jpeg").await;
        assert!(matches!(result, Err(LuneError::BlobStorage(_))));
        assert_eq!(backend.get(key).await.unwrap(), Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent_blob() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        let result = backend.get("20251001_000000_absent.png").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete_blob() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        let key = "20251002_090000_plage.png";
        backend.put(key, b"to be deleted".to_vec(), "image/png").await.unwrap();
        assert!(backend.exists(key).await.unwrap());

        backend.delete(key).await.unwrap();
        assert!(!backend.exists(key).await.unwrap());

        // Second delete is a no-op
        backend.delete(key).await.unwrap();
    }

    #[tokio::test]
    async fn test_directory_sharding() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        let path = backend.get_blob_path("20251001_201500_lune.jpg").unwrap();
        assert!(path.to_string_lossy().contains("/202510/"));

        let path = backend.get_blob_path("lune.jpg").unwrap();
        assert!(path.to_string_lossy().contains("/_/"));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf());

        assert!(backend.get("../secret").await.is_err());
        assert!(backend.put("a/b", vec![], "image/png").await.is_err());
    }
}
