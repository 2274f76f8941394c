//! Platform HTTP Client
//!
//! A typed async client for the compute platform API used by the end-to-end
//! harness: jobs, user storage, blob storage, the container registry and the
//! admin calls that provision test users.
//!
//! Job operations sit behind the [`JobsApi`] trait so the waiters in the
//! harness can run against a scripted implementation in tests.
//!
//! # Example
//!
//! ```no_run
//! use e2e_client::{JobsApi, PlatformClient};
//!
//! #[tokio::main]
//! async fn main() -> e2e_client::Result<()> {
//!     let client = PlatformClient::new("https://api.dev.apolo.us/api/v1").with_token("secret");
//!
//!     let job = client.status("job-0c5b1a").await?;
//!     println!("{} is {}", job.id, job.status);
//!     Ok(())
//! }
//! ```

mod admin;
mod blob;
pub mod error;
mod jobs;
mod registry;
mod storage;

pub use error::{ClientError, Result};
pub use jobs::{JobsApi, OutputStream};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// HTTP client for the platform API
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    /// Base URL of the API (e.g., "https://api.dev.apolo.us/api/v1")
    api_url: String,
    /// Base URL of the cluster container registry
    registry_url: Option<String>,
    /// Bearer token attached to every request
    token: Option<String>,
    client: Client,
}

impl PlatformClient {
    /// Create a new platform client
    ///
    /// # Arguments
    /// * `api_url` - The base URL of the platform API
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(api_url, Client::new())
    }

    /// Create a new platform client with a custom HTTP client
    ///
    /// This allows configuring timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use e2e_client::PlatformClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(180))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = PlatformClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(api_url: impl Into<String>, client: Client) -> Self {
        let api_url = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            registry_url: None,
            token: None,
            client,
        }
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the container registry base URL
    pub fn with_registry(mut self, registry_url: impl Into<String>) -> Self {
        let registry_url = registry_url.into();
        self.registry_url = Some(registry_url.trim_end_matches('/').to_string());
        self
    }

    /// Get the base URL of the API
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Get the registry base URL, if configured
    pub fn registry_url(&self) -> Option<&str> {
        self.registry_url.as_deref()
    }

    /// Host part of the registry URL, as used in image references
    pub fn registry_host(&self) -> Option<String> {
        let url = reqwest::Url::parse(self.registry_url.as_deref()?).ok()?;
        let host = url.host_str()?;
        Some(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    /// Start a request against an absolute URL with authentication applied
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and turn failures into [`ClientError::ApiError`]
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PlatformClient::new("http://localhost:8080/api/v1");
        assert_eq!(client.api_url(), "http://localhost:8080/api/v1");
        assert!(client.registry_url().is_none());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = PlatformClient::new("http://localhost:8080/api/v1/")
            .with_registry("https://registry.example.com/");
        assert_eq!(client.api_url(), "http://localhost:8080/api/v1");
        assert_eq!(client.registry_url(), Some("https://registry.example.com"));
    }

    #[test]
    fn test_registry_host() {
        let client = PlatformClient::new("http://localhost")
            .with_registry("https://registry.example.com");
        assert_eq!(
            client.registry_host().as_deref(),
            Some("registry.example.com")
        );

        let client = PlatformClient::new("http://localhost").with_registry("http://127.0.0.1:5000");
        assert_eq!(client.registry_host().as_deref(), Some("127.0.0.1:5000"));
    }
}
