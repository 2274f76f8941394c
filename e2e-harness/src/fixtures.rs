//! Suite fixtures
//!
//! Jobs started by a suite are registered with a [`JobReaper`] and stopped
//! when the suite is done with them. [`SecretJob`] is the nginx job the
//! network suites probe.

use e2e_client::JobsApi;
use e2e_core::domain::job::{HttpPort, JobStatus, Resources};
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::WaitError;
use crate::helper::{Helper, RunJobOptions};

pub const SECRET_JOB_IMAGE: &str = "ghcr.io/neuro-inc/nginx:latest";

/// Kills registered jobs once the suite is done with them
pub struct JobReaper {
    helper: Arc<Helper>,
    job_ids: Mutex<Vec<String>>,
}

impl JobReaper {
    pub fn new(helper: Arc<Helper>) -> Self {
        Self {
            helper,
            job_ids: Mutex::new(Vec::new()),
        }
    }

    /// Register a job to be killed by [`reap`](Self::reap)
    pub async fn kill_later(&self, job_id: impl Into<String>) {
        self.job_ids.lock().await.push(job_id.into());
    }

    /// Kill every registered job, then wait for each to be cancelled
    ///
    /// Jobs that no longer exist are skipped.
    pub async fn reap(&self) -> Result<(), WaitError> {
        let job_ids = std::mem::take(&mut *self.job_ids.lock().await);

        for job_id in &job_ids {
            info!("Kill job {}", job_id);
            match self.helper.client().kill(job_id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => debug!("Job {} is already gone", job_id),
                Err(e) => return Err(e.into()),
            }
        }

        for job_id in &job_ids {
            self.helper
                .wait_job_state(job_id, JobStatus::Cancelled)
                .await?;
        }
        Ok(())
    }
}

/// How to start a [`SecretJob`]
#[derive(Debug, Clone, Default)]
pub struct SecretJobSpec {
    /// Forward port 80 through the platform ingress
    pub http_port: bool,
    /// Require platform authentication on the forwarded port
    pub http_auth: bool,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SecretJobSpec {
    pub fn with_http(http_auth: bool) -> Self {
        Self {
            http_port: true,
            http_auth,
            ..Self::default()
        }
    }

    fn description(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        let mut description = String::from("nginx with secret file");
        if self.http_port {
            description.push_str(" and forwarded http port");
            if self.http_auth {
                description.push_str(" with authentication");
            }
        }
        description
    }
}

/// A running nginx job serving a random secret at `/secret.txt`
#[derive(Debug, Clone)]
pub struct SecretJob {
    pub id: String,
    pub secret: String,
    pub ingress_url: Option<Url>,
    pub internal_hostname: Option<String>,
    pub internal_hostname_named: Option<String>,
}

impl SecretJob {
    /// Start the job, register it with `reaper` and wait until it runs
    pub async fn start(
        helper: &Helper,
        reaper: &JobReaper,
        spec: SecretJobSpec,
    ) -> Result<Self, WaitError> {
        let secret = Uuid::new_v4().to_string();

        let mut options = RunJobOptions::default()
            .with_description(spec.description())
            .with_resources(Resources::new(0.1, 256 * 1_000_000));
        options.name = spec.name.clone();
        if spec.http_port {
            options = options.with_http(HttpPort::new(80, spec.http_auth));
        }

        let command = serve_command(&secret);
        let job = helper
            .run_job(SECRET_JOB_IMAGE, Some(command.as_str()), options)
            .await?;
        reaper.kill_later(job.id.clone()).await;

        Ok(Self {
            id: job.id,
            secret,
            ingress_url: job.http_url,
            internal_hostname: job.internal_hostname,
            internal_hostname_named: job.internal_hostname_named,
        })
    }

    /// The secret behind the platform ingress, if the port is forwarded
    pub fn secret_url(&self) -> Option<Url> {
        let mut url = self.ingress_url.clone()?;
        url.set_path("/secret.txt");
        Some(url)
    }

    /// The secret on the cluster network
    pub fn internal_secret_url(&self) -> Option<String> {
        self.internal_hostname
            .as_ref()
            .map(|host| format!("http://{}/secret.txt", host))
    }
}

fn serve_command(secret: &str) -> String {
    format!(
        "bash -c \"echo -n '{}' > /usr/share/nginx/html/secret.txt; \
         timeout 15m /usr/sbin/nginx -g 'daemon off;'\"",
        secret
    )
}
