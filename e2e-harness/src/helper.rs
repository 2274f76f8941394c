//! Per-test facade over the platform
//!
//! A `Helper` owns an authenticated client, a scratch directory and a
//! temporary storage root unique to the helper. Job operations go through
//! the waiters; everything else is a thin call into the client.

use anyhow::Context;
use e2e_client::{JobsApi, PlatformClient};
use e2e_core::domain::job::{Container, HttpPort, JobDescription, JobStatus, Resources, Volume};
use e2e_core::domain::storage::Bucket;
use e2e_core::dto::blob::CreateBucket;
use e2e_core::dto::job::RunJob;
use regex::Regex;
use reqwest::Url;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::checksum;
use crate::config::{E2eConfig, OutputConfig, WaitConfig};
use crate::error::{ProbeError, WaitError};
use crate::provision;
use crate::waiter::{JobStateWaiter, OutputWaiter};

const PROBE_ATTEMPTS: u32 = 3;
const PROBE_DELAY: Duration = Duration::from_secs(5);

/// Optional parts of a job submission
#[derive(Debug, Clone)]
pub struct RunJobOptions {
    pub description: Option<String>,
    pub name: Option<String>,
    /// Status to wait for after submission
    pub wait_state: JobStatus,
    pub http: Option<HttpPort>,
    /// Defaults to [`Resources::default`]
    pub resources: Option<Resources>,
    pub volumes: Vec<Volume>,
}

impl Default for RunJobOptions {
    fn default() -> Self {
        Self {
            description: None,
            name: None,
            wait_state: JobStatus::Running,
            http: None,
            resources: None,
            volumes: Vec::new(),
        }
    }
}

impl RunJobOptions {
    pub fn wait_for(mut self, state: JobStatus) -> Self {
        self.wait_state = state;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_http(mut self, http: HttpPort) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = Some(resources);
        self
    }
}

pub struct Helper {
    client: Arc<PlatformClient>,
    user_name: String,
    /// Project jobs are submitted to; the user's current project when unset
    project_name: Option<String>,
    tmp_path: PathBuf,
    tmpstorage: Url,
    has_root_storage: AtomicBool,
    state_waiter: JobStateWaiter,
    output_waiter: OutputWaiter,
    http: reqwest::Client,
    probe_delay: Duration,
}

impl Helper {
    pub fn new(
        client: PlatformClient,
        user_name: impl Into<String>,
        tmp_path: impl Into<PathBuf>,
        wait: WaitConfig,
        output: OutputConfig,
    ) -> anyhow::Result<Self> {
        let user_name = user_name.into();
        let tmpstorage = Url::parse(&format!("storage://{}/{}/", user_name, Uuid::new_v4()))
            .with_context(|| format!("Invalid storage root for user {}", user_name))?;

        let client = Arc::new(client);
        let jobs: Arc<dyn JobsApi> = client.clone();

        Ok(Self {
            state_waiter: JobStateWaiter::new(jobs.clone(), wait),
            output_waiter: OutputWaiter::new(jobs, output),
            client,
            user_name,
            project_name: None,
            tmp_path: tmp_path.into(),
            tmpstorage,
            has_root_storage: AtomicBool::new(false),
            http: reqwest::Client::new(),
            probe_delay: PROBE_DELAY,
        })
    }

    /// Helper acting as the user of `config`
    pub fn from_config(config: &E2eConfig, tmp_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Self::new(
            config.client()?,
            config.user_name(),
            tmp_path,
            config.wait,
            config.output,
        )
    }

    /// Helper working in the user's default project
    ///
    /// The config must carry a user token (see [`E2eConfig::provision`]).
    /// Creates `<user>-default` in the cluster unless it already exists.
    pub async fn connect(config: &E2eConfig, tmp_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let user_name = config.user_name();
        let project = provision::ensure_project(
            &config.project_client()?,
            &config.cluster_name,
            &user_name,
        )
        .await?;
        info!("User {} works in project {}", user_name, project);

        Ok(Self::from_config(config, tmp_path)?.with_project(project))
    }

    /// Submit jobs to `project`
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project_name = Some(project.into());
        self
    }

    /// Change the pause between HTTP probes
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    pub fn client(&self) -> &PlatformClient {
        &self.client
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Temporary storage root of this helper
    pub fn tmpstorage(&self) -> &Url {
        &self.tmpstorage
    }

    /// Location under the temporary storage root
    pub fn storage_uri(&self, path: &str) -> anyhow::Result<Url> {
        self.tmpstorage
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("Invalid storage path: {}", path))
    }

    pub fn registry_host(&self) -> Option<String> {
        self.client.registry_host()
    }

    /// Remove the temporary storage root if this helper created it
    pub async fn close(&self) -> anyhow::Result<()> {
        if self.has_root_storage.swap(false, Ordering::SeqCst) {
            self.client
                .rm(&self.tmpstorage)
                .await
                .with_context(|| format!("Failed to remove {}", self.tmpstorage))?;
        }
        Ok(())
    }

    // =============================================================================
    // Jobs
    // =============================================================================

    /// Submit a non-preemptible job and wait for `options.wait_state`
    pub async fn run_job(
        &self,
        image: &str,
        command: Option<&str>,
        options: RunJobOptions,
    ) -> Result<JobDescription, WaitError> {
        let mut container = Container::new(image, options.resources.unwrap_or_default());
        container.command = command.map(str::to_string);
        container.http = options.http;
        container.volumes = options.volumes;

        let mut req = RunJob::new(container);
        req.name = options.name;
        req.description = options.description;
        req.is_preemptible = false;
        req.project_name = self.project_name.clone();

        info!("Submit job {}", image);
        let job = self.client.submit(req).await?;
        info!("Job {} submitted, waiting for {}", job.id, options.wait_state);

        self.state_waiter.wait_from(job, options.wait_state).await
    }

    pub async fn wait_job_state(
        &self,
        job_id: &str,
        state: JobStatus,
    ) -> Result<JobDescription, WaitError> {
        self.state_waiter.wait(job_id, state).await
    }

    /// Wait until the job output matches `pattern`
    pub async fn check_job_output(&self, job_id: &str, pattern: &str) -> Result<String, WaitError> {
        self.output_waiter.wait_for(job_id, pattern).await
    }

    pub async fn check_job_output_regex(
        &self,
        job_id: &str,
        pattern: &Regex,
    ) -> Result<String, WaitError> {
        self.output_waiter.wait_for_regex(job_id, pattern).await
    }

    /// Fetch `url`, trying a few times while the endpoint comes up
    ///
    /// Returns the body of the first 200 response.
    pub async fn http_get(&self, url: &str) -> Result<String, ProbeError> {
        let mut last_status = 0;
        for attempt in 1..=PROBE_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(self.probe_delay).await;
            }

            info!("Probe {}", url);
            let response = self.http.get(url).send().await?;
            if response.status() == reqwest::StatusCode::OK {
                return Ok(response.text().await?);
            }
            last_status = response.status().as_u16();
        }

        Err(ProbeError::UnexpectedStatus {
            url: url.to_string(),
            status: last_status,
        })
    }

    // =============================================================================
    // Storage
    // =============================================================================

    /// Create a directory under the temporary storage root
    pub async fn mkdir(&self, path: &str) -> anyhow::Result<()> {
        self.ensure_root_storage().await?;
        let uri = self.storage_uri(path)?;
        self.client
            .mkdirs(&uri)
            .await
            .with_context(|| format!("Failed to create {}", uri))
    }

    pub async fn rm(&self, path: &str) -> anyhow::Result<()> {
        let uri = self.storage_uri(path)?;
        self.client
            .rm(&uri)
            .await
            .with_context(|| format!("Failed to remove {}", uri))
    }

    /// Create the temporary storage root once
    pub async fn ensure_root_storage(&self) -> anyhow::Result<()> {
        if self.has_root_storage.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(e) = self.client.mkdirs(&self.tmpstorage).await {
            self.has_root_storage.store(false, Ordering::SeqCst);
            return Err(e).with_context(|| format!("Failed to create {}", self.tmpstorage));
        }
        Ok(())
    }

    // =============================================================================
    // Checksums
    // =============================================================================

    /// Write `size` random bytes to `path` and return their SHA-1
    pub async fn gen_random_file(&self, path: &Path, size: u64) -> anyhow::Result<String> {
        checksum::write_random_file(path, size)
            .await
            .with_context(|| format!("Failed to generate {}", path.display()))
    }

    pub async fn calc_local_checksum(&self, path: &Path) -> anyhow::Result<String> {
        checksum::file_checksum(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    /// SHA-1 of a file under the temporary storage root
    pub async fn calc_storage_checksum(&self, path: &str) -> anyhow::Result<String> {
        let uri = self.storage_uri(path)?;
        let scratch = self.tmp_path.join(format!("{}.tmp", Uuid::new_v4()));

        self.client
            .download_file(&uri, &scratch)
            .await
            .with_context(|| format!("Failed to download {}", uri))?;
        let checksum = self.calc_local_checksum(&scratch).await;

        if let Err(e) = tokio::fs::remove_file(&scratch).await {
            warn!("Failed to remove {}: {}", scratch.display(), e);
        }
        checksum
    }

    // =============================================================================
    // Buckets
    // =============================================================================

    pub async fn create_tmp_bucket(&self) -> anyhow::Result<Bucket> {
        let name = format!("e2e-{}", Uuid::new_v4().simple());
        let bucket = self
            .client
            .create_bucket(CreateBucket { name: Some(name) })
            .await
            .context("Failed to create bucket")?;
        info!("Created bucket {}", bucket.name);
        Ok(bucket)
    }

    pub async fn delete_bucket(&self, name: &str) -> anyhow::Result<()> {
        self.client
            .delete_bucket(name)
            .await
            .with_context(|| format!("Failed to delete bucket {}", name))
    }

    /// Run `f` with a fresh bucket, deleting the bucket afterwards
    ///
    /// The bucket is deleted even when `f` fails; the error of `f` wins over
    /// a failed deletion.
    pub async fn with_tmp_bucket<F, Fut, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(Bucket) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let bucket = self.create_tmp_bucket().await?;
        let name = bucket.name.clone();

        let result = f(bucket).await;
        let deleted = self.delete_bucket(&name).await;

        match (result, deleted) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), deleted) => {
                if let Err(delete_err) = deleted {
                    warn!("{:#}", delete_err);
                }
                Err(e)
            }
        }
    }
}
