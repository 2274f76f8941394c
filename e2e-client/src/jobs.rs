//! Job-related API endpoints

use async_trait::async_trait;
use e2e_core::domain::job::JobDescription;
use e2e_core::dto::job::{JobFilter, RunJob};
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Method;
use tracing::debug;

use crate::PlatformClient;
use crate::error::{ClientError, Result};

/// Raw job output, one item per chunk received from the platform
///
/// The stream ends when the job's output ends.
pub type OutputStream = BoxStream<'static, Result<Vec<u8>>>;

/// Job operations the harness depends on
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Submits a job and returns its first snapshot
    async fn submit(&self, req: RunJob) -> Result<JobDescription>;

    /// Fetches a fresh snapshot of a job
    async fn status(&self, job_id: &str) -> Result<JobDescription>;

    /// Asks the platform to stop a job
    async fn kill(&self, job_id: &str) -> Result<()>;

    /// Lists the caller's jobs matching a filter
    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobDescription>>;

    /// Opens the job's output stream from its beginning
    async fn monitor(&self, job_id: &str) -> Result<OutputStream>;
}

#[async_trait]
impl JobsApi for PlatformClient {
    async fn submit(&self, req: RunJob) -> Result<JobDescription> {
        let url = format!("{}/jobs", self.api_url);
        let response = self.request(Method::POST, &url).json(&req).send().await?;

        self.handle_response(response).await
    }

    async fn status(&self, job_id: &str) -> Result<JobDescription> {
        let url = format!("{}/jobs/{}", self.api_url, job_id);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    async fn kill(&self, job_id: &str) -> Result<()> {
        let url = format!("{}/jobs/{}", self.api_url, job_id);
        let response = self.request(Method::DELETE, &url).send().await?;

        self.handle_empty_response(response).await
    }

    async fn list(&self, filter: &JobFilter) -> Result<Vec<JobDescription>> {
        let url = format!("{}/jobs", self.api_url);
        let response = self
            .request(Method::GET, &url)
            .query(&filter.to_query())
            .send()
            .await?;

        let listing: JobListing = self.handle_response(response).await?;
        Ok(listing.jobs)
    }

    async fn monitor(&self, job_id: &str) -> Result<OutputStream> {
        let url = format!("{}/jobs/{}/log", self.api_url, job_id);
        debug!("Opening output stream for job {}", job_id);
        let response = self.request(Method::GET, &url).send().await?;
        let response = Self::check_status(response).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ClientError::from))
            .boxed())
    }
}

#[derive(serde::Deserialize)]
struct JobListing {
    jobs: Vec<JobDescription>,
}
