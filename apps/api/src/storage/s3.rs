use std::time::Duration;

use async_trait::async_trait;
use aws_config::{timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::{
    config::Credentials, error::DisplayErrorContext, presigning::PresigningConfig,
    primitives::ByteStream, Client,
};
use bytes::Bytes;
use tracing::debug;

use crate::config::Config;
use crate::errors::AppError;
use crate::storage::ObjectStore;

/// `ObjectStore` backed by an S3 bucket (AWS or an S3-compatible endpoint).
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    endpoint: Option<String>,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String, endpoint: Option<String>) -> Self {
        Self {
            client,
            bucket,
            endpoint,
        }
    }

    /// Builds the SDK client from static credentials. A custom endpoint
    /// switches to path-style addressing.
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "resume-gate-static",
        );

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(config.request_timeout())
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .credentials_provider(credentials)
            .timeout_config(timeouts);
        if let Some(endpoint) = &config.s3_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.s3_endpoint.is_some())
            .build();

        Self::new(
            Client::from_conf(s3_config),
            config.s3_bucket.clone(),
            config.s3_endpoint.clone(),
        )
    }
}

fn storage_error<E: std::error::Error>(action: &str, key: &str, err: E) -> AppError {
    AppError::Storage(format!("{action} '{key}' failed: {}", DisplayErrorContext(err)))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError> {
        debug!("PUT s3://{}/{}", self.bucket, key);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| storage_error("upload", key, e))?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, AppError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    return Err(AppError::NotFound(format!("No object at {key}")));
                }
                return Err(storage_error("download", key, service));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| storage_error("read body of", key, e))?;
        Ok(data.into_bytes())
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service = err.into_service_error();
                if service.is_not_found() {
                    Ok(false)
                } else {
                    Err(storage_error("head", key, service))
                }
            }
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| storage_error("list", prefix, e))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| !key.is_empty())
                    .map(str::to_string),
            );

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        debug!("Listed {} keys under s3://{}/{}", keys.len(), self.bucket, prefix);
        Ok(keys)
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("delete", key, e))?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, AppError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| storage_error("presign", key, e))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| storage_error("presign", key, e))?;

        Ok(request.uri().to_string())
    }

    fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }
}
