//! Object storage gateway.
//!
//! `ObjectStore` is the raw bucket seam (S3 in production, in-memory in
//! tests). `StorageGateway` adds key construction, upload limits and document
//! discovery on top of it and is what handlers talk to.

pub mod handlers;
pub mod keys;
pub mod s3;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;

pub use s3::S3ObjectStore;

/// Low-level bucket operations keyed by full object key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError>;

    /// Returns `AppError::NotFound` when the key does not exist.
    async fn get_object(&self, key: &str) -> Result<Bytes, AppError>;

    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    /// All keys under `prefix`, in the store's listing order.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AppError>;

    async fn delete_object(&self, key: &str) -> Result<(), AppError>;

    /// Time-limited GET link for `key`.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, AppError>;

    /// Permanent location URL reported after an upload.
    fn object_url(&self, key: &str) -> String;
}

#[derive(Clone)]
pub struct StorageGateway {
    store: Arc<dyn ObjectStore>,
    max_upload_bytes: usize,
}

impl StorageGateway {
    pub fn new(store: Arc<dyn ObjectStore>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Stores `content` at `<directory>/<filename>` and returns its location URL.
    /// Limits are checked before the store is touched.
    pub async fn upload(
        &self,
        directory: &str,
        filename: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, AppError> {
        if keys::clean_filename(filename).is_empty() {
            return Err(AppError::Validation("Filename is required".to_string()));
        }
        check_upload_size(content.len(), self.max_upload_bytes)?;

        let key = keys::build_key(directory, filename);
        let size = content.len();
        self.store.put_object(&key, content, content_type).await?;

        let url = self.store.object_url(&key);
        info!("Uploaded {size} bytes to {key}");
        Ok(url)
    }

    pub async fn list(&self, directory: &str) -> Result<Vec<String>, AppError> {
        self.store.list_keys(&keys::list_prefix(directory)).await
    }

    pub async fn download(&self, directory: &str, filename: &str) -> Result<Bytes, AppError> {
        self.store
            .get_object(&keys::build_key(directory, filename))
            .await
    }

    pub async fn delete(&self, directory: &str, filename: &str) -> Result<(), AppError> {
        let key = keys::build_key(directory, filename);
        self.store.delete_object(&key).await?;
        info!("Deleted {key}");
        Ok(())
    }

    pub async fn signed_link(&self, key: &str, expires_in: Duration) -> Result<String, AppError> {
        self.store.presign_get(key, expires_in).await
    }

    /// Finds the stored document for `id`.
    ///
    /// `updates/<id>/resume.pdf` is checked directly. Otherwise the
    /// `updates/<id>/` prefix is listed and the lexicographically first key
    /// wins.
    pub async fn find_document(&self, id: &str) -> Result<Option<String>, AppError> {
        if !keys::is_valid_identifier(id) {
            return Err(AppError::Validation(format!("Invalid resume id '{id}'")));
        }

        let directory = keys::updates_directory(id);
        let canonical = keys::build_key(&directory, keys::CANONICAL_DOCUMENT);
        if self.store.exists(&canonical).await? {
            return Ok(Some(canonical));
        }

        let mut candidates = self.list(&directory).await?;
        candidates.sort();
        if candidates.len() > 1 {
            warn!(
                "{} documents stored under {directory}/, using {}",
                candidates.len(),
                candidates[0]
            );
        }
        Ok(candidates.into_iter().next())
    }
}

pub fn check_upload_size(size: usize, max: usize) -> Result<(), AppError> {
    if size > max {
        return Err(AppError::PayloadTooLarge(format!(
            "File size must be less than {}MB",
            max / (1024 * 1024)
        )));
    }
    Ok(())
}
