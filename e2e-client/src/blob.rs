//! Blob storage endpoints

use chrono::{DateTime, Utc};
use e2e_core::domain::storage::{BlobEntry, Bucket};
use e2e_core::dto::blob::CreateBucket;
use reqwest::header::{CONTENT_LENGTH, LAST_MODIFIED};
use reqwest::{Body, Method};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::PlatformClient;
use crate::error::{ClientError, Result};
use crate::storage::write_body;

impl PlatformClient {
    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/blob/buckets/{}/objects/{}",
            self.api_url,
            bucket,
            key.trim_start_matches('/')
        )
    }

    // =============================================================================
    // Buckets
    // =============================================================================

    /// Create a bucket
    pub async fn create_bucket(&self, req: CreateBucket) -> Result<Bucket> {
        let url = format!("{}/blob/buckets", self.api_url);
        let response = self.request(Method::POST, &url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// List the caller's buckets
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let url = format!("{}/blob/buckets", self.api_url);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    /// Delete a bucket
    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let url = format!("{}/blob/buckets/{}", self.api_url, bucket);
        let response = self.request(Method::DELETE, &url).send().await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Objects
    // =============================================================================

    /// List objects in a bucket under a key prefix
    pub async fn list_blobs(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobEntry>> {
        let url = format!("{}/blob/buckets/{}/objects", self.api_url, bucket);
        let response = self
            .request(Method::GET, &url)
            .query(&[("prefix", prefix)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch object metadata without its content
    pub async fn head_blob(&self, bucket: &str, key: &str) -> Result<BlobEntry> {
        let url = self.object_url(bucket, key);
        let response = self.request(Method::HEAD, &url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("{}/{}", bucket, key)));
        }
        let response = Self::check_status(response).await?;
        let headers = response.headers();

        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| ClientError::ParseError("missing Content-Length".to_string()))?;
        let modified_at = headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|t| t.with_timezone(&Utc));

        Ok(BlobEntry {
            key: key.to_string(),
            size,
            modified_at,
        })
    }

    /// Upload a local file as an object
    pub async fn upload_blob(&self, src: &Path, bucket: &str, key: &str) -> Result<()> {
        let url = self.object_url(bucket, key);
        let file = tokio::fs::File::open(src).await?;
        info!("Upload {} -> blob:{}/{}", src.display(), bucket, key);

        let response = self
            .request(Method::PUT, &url)
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Download an object into a local file
    pub async fn download_blob(&self, bucket: &str, key: &str, dst: &Path) -> Result<()> {
        let url = self.object_url(bucket, key);
        info!("Download blob:{}/{} -> {}", bucket, key, dst.display());

        let response = self.request(Method::GET, &url).send().await?;
        let response = Self::check_status(response).await?;

        write_body(response, dst).await
    }
}
