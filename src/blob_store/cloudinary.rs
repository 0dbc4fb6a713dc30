/// Cloudinary blob storage backend
///
/// Uploads and deletions go through the signed REST API; reads go through
/// the public delivery CDN.
use crate::{
    blob_store::{BlobBackend, StoredBlob},
    error::{LuneError, LuneResult},
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://api.cloudinary.com";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

pub struct CloudinaryBackend {
    client: Client,
    api_base: String,
    delivery_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryBackend {
    pub fn new(
        cloud_name: String,
        api_key: String,
        api_secret: String,
        folder: String,
    ) -> LuneResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LuneError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: API_BASE.to_string(),
            delivery_base: DELIVERY_BASE.to_string(),
            cloud_name,
            api_key,
            api_secret,
            folder,
        })
    }

    /// Point the backend at other API and delivery hosts
    pub fn with_endpoints(mut self, api_base: &str, delivery_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.delivery_base = delivery_base.trim_end_matches('/').to_string();
        self
    }

    /// Cloudinary public ids carry no file extension
    fn public_id(key: &str) -> &str {
        match key.rfind('.') {
            Some(idx) if idx > 0 => &key[..idx],
            _ => key,
        }
    }

    fn full_public_id(&self, key: &str) -> String {
        format!("{}/{}", self.folder, Self::public_id(key))
    }

    /// Request signature: the signed parameters sorted by name, joined as a
    /// query string, with the API secret appended, hashed with SHA-256.
    fn sign(&self, params: &mut [(&str, String)]) -> String {
        params.sort_by(|a, b| a.0.cmp(b.0));
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn api_url(&self, action: &str) -> String {
        format!("{}/v1_1/{}/image/{}", self.api_base, self.cloud_name, action)
    }

    fn delivery_url(&self, key: &str) -> String {
        format!(
            "{}/{}/image/upload/{}/{}",
            self.delivery_base, self.cloud_name, self.folder, key
        )
    }
}

fn storage_error(action: &str, e: impl std::fmt::Display) -> LuneError {
    LuneError::BlobStorage(format!("Cloudinary {} failed: {}", action, e))
}

#[async_trait]
impl BlobBackend for CloudinaryBackend {
    async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> LuneResult<StoredBlob> {
        let timestamp = Utc::now().timestamp().to_string();
        let public_id = Self::public_id(key).to_string();
        let signature = self.sign(&mut [
            ("folder", self.folder.clone()),
            ("public_id", public_id.clone()),
            ("timestamp", timestamp.clone()),
        ]);

        let file = multipart::Part::bytes(data)
            .file_name(key.to_string())
            .mime_str(mime_type)
            .map_err(|e| storage_error("upload", e))?;

        let form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("public_id", public_id)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.api_url("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| storage_error("upload", e))?;

        if !response.status().is_success() {
            return Err(storage_error("upload", response.status()));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| storage_error("upload", e))?;

        debug!("Uploaded {} to Cloudinary", key);
        Ok(StoredBlob {
            url: Some(body.secure_url),
        })
    }

    async fn get(&self, key: &str) -> LuneResult<Option<Vec<u8>>> {
        let response = self
            .client
            .get(self.delivery_url(key))
            .send()
            .await
            .map_err(|e| storage_error("download", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| storage_error("download", e))?;
                Ok(Some(bytes.to_vec()))
            }
            status => Err(storage_error("download", status)),
        }
    }

    async fn delete(&self, key: &str) -> LuneResult<()> {
        let timestamp = Utc::now().timestamp().to_string();
        let public_id = self.full_public_id(key);
        let signature = self.sign(&mut [
            ("public_id", public_id.clone()),
            ("timestamp", timestamp.clone()),
        ]);

        let params = [
            ("public_id", public_id),
            ("timestamp", timestamp),
            ("api_key", self.api_key.clone()),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ];

        let response = self
            .client
            .post(self.api_url("destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| storage_error("destroy", e))?;

        if !response.status().is_success() {
            return Err(storage_error("destroy", response.status()));
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| storage_error("destroy", e))?;

        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(storage_error("destroy", other)),
        }
    }

    async fn exists(&self, key: &str) -> LuneResult<bool> {
        let response = self
            .client
            .head(self.delivery_url(key))
            .send()
            .await
            .map_err(|e| storage_error("lookup", e))?;

        Ok(response.status().is_success())
    }

    fn backend_name(&self) -> &'static str {
        "cloudinary"
    }
}
