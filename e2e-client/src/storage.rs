//! User storage endpoints
//!
//! Storage locations are addressed with `storage://<owner>/<path>` URIs.

use e2e_core::domain::storage::FileStatus;
use futures::StreamExt;
use reqwest::{Body, Method, Url};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::PlatformClient;
use crate::error::{ClientError, Result};

impl PlatformClient {
    /// Resolve a `storage://` URI to its API endpoint
    fn storage_endpoint(&self, uri: &Url) -> Result<String> {
        if uri.scheme() != "storage" {
            return Err(ClientError::InvalidRequest(format!(
                "expected a storage:// URI, got {}",
                uri
            )));
        }
        let owner = uri.host_str().unwrap_or_default();
        let path = uri.path().trim_start_matches('/');
        Ok(format!("{}/storage/{}/{}", self.api_url, owner, path))
    }

    /// Create a directory and all missing parents
    pub async fn mkdirs(&self, uri: &Url) -> Result<()> {
        let url = self.storage_endpoint(uri)?;
        debug!("mkdirs {}", uri);
        let response = self
            .request(Method::PUT, &url)
            .query(&[("op", "MKDIRS")])
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Remove a file or a directory tree
    pub async fn rm(&self, uri: &Url) -> Result<()> {
        let url = self.storage_endpoint(uri)?;
        debug!("rm {}", uri);
        let response = self
            .request(Method::DELETE, &url)
            .query(&[("recursive", "true")])
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Get the status of a storage entry
    pub async fn stat(&self, uri: &Url) -> Result<FileStatus> {
        let url = self.storage_endpoint(uri)?;
        let response = self
            .request(Method::GET, &url)
            .query(&[("op", "GETFILESTATUS")])
            .send()
            .await?;

        let wrapper: FileStatusResponse = self.handle_response(response).await?;
        Ok(wrapper.file_status)
    }

    /// Upload a local file, streaming its content
    pub async fn upload_file(&self, src: &Path, dst: &Url) -> Result<()> {
        let url = self.storage_endpoint(dst)?;
        let file = tokio::fs::File::open(src).await?;
        info!("Upload {} -> {}", src.display(), dst);

        let response = self
            .request(Method::PUT, &url)
            .query(&[("op", "CREATE")])
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Download a storage file into a local path
    pub async fn download_file(&self, src: &Url, dst: &Path) -> Result<()> {
        let url = self.storage_endpoint(src)?;
        info!("Download {} -> {}", src, dst.display());

        let response = self
            .request(Method::GET, &url)
            .query(&[("op", "OPEN")])
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        write_body(response, dst).await
    }
}

/// Stream a response body into a local file
pub(crate) async fn write_body(response: reqwest::Response, dst: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(dst).await?;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(())
}

#[derive(serde::Deserialize)]
struct FileStatusResponse {
    #[serde(rename = "FileStatus")]
    file_status: FileStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_endpoint() {
        let client = PlatformClient::new("http://localhost/api/v1");
        let uri = Url::parse("storage://alice/tmp-1/data").unwrap();
        assert_eq!(
            client.storage_endpoint(&uri).unwrap(),
            "http://localhost/api/v1/storage/alice/tmp-1/data"
        );
    }

    #[test]
    fn test_storage_endpoint_rejects_other_schemes() {
        let client = PlatformClient::new("http://localhost/api/v1");
        let uri = Url::parse("file:///tmp/data").unwrap();
        assert!(matches!(
            client.storage_endpoint(&uri),
            Err(ClientError::InvalidRequest(_))
        ));
    }
}
