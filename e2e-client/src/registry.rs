//! Container registry endpoints (Docker Registry HTTP API v2)
//!
//! Pushing and pulling image layers is left to the local container engine;
//! this module only covers the metadata calls the harness checks.

use e2e_core::domain::image::RemoteImage;
use reqwest::Method;
use reqwest::header::ACCEPT;

use crate::PlatformClient;
use crate::error::{ClientError, Result};

const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
const DIGEST_HEADER: &str = "Docker-Content-Digest";

impl PlatformClient {
    fn registry_base(&self) -> Result<&str> {
        self.registry_url
            .as_deref()
            .ok_or_else(|| ClientError::InvalidRequest("registry url is not configured".into()))
    }

    /// List tags of a repository (`owner/name`)
    pub async fn image_tags(&self, repository: &str) -> Result<Vec<String>> {
        let url = format!("{}/v2/{}/tags/list", self.registry_base()?, repository);
        let response = self.request(Method::GET, &url).send().await?;

        let listing: TagListing = self.handle_response(response).await?;
        Ok(listing.tags.unwrap_or_default())
    }

    /// Resolve the manifest digest of a tagged image
    pub async fn image_digest(&self, image: &RemoteImage) -> Result<String> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_base()?,
            image.repository(),
            image.tag
        );
        let response = self
            .request(Method::HEAD, &url)
            .header(ACCEPT, MANIFEST_V2)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ClientError::ParseError(format!("{} header missing", DIGEST_HEADER)))
    }

    /// Delete an image manifest by digest
    pub async fn image_rm(&self, image: &RemoteImage, digest: &str) -> Result<()> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_base()?,
            image.repository(),
            digest
        );
        let response = self.request(Method::DELETE, &url).send().await?;

        self.handle_empty_response(response).await
    }
}

#[derive(serde::Deserialize)]
struct TagListing {
    tags: Option<Vec<String>>,
}
