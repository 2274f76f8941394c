//! Job output waiter

use e2e_client::JobsApi;
use futures::StreamExt;
use regex::Regex;
use std::sync::Arc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::config::OutputConfig;
use crate::error::WaitError;

/// Watches a job's output until it matches a pattern
pub struct OutputWaiter {
    jobs: Arc<dyn JobsApi>,
    config: OutputConfig,
}

impl OutputWaiter {
    pub fn new(jobs: Arc<dyn JobsApi>, config: OutputConfig) -> Self {
        Self { jobs, config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Wait until the job output matches `pattern`
    ///
    /// Returns the accumulated output at the time of the match.
    pub async fn wait_for(&self, job_id: &str, pattern: &str) -> Result<String, WaitError> {
        let regex = Regex::new(pattern)?;
        self.wait_for_regex(job_id, &regex).await
    }

    /// Like [`wait_for`](Self::wait_for) with a pre-built regex, so callers
    /// can set flags such as case-insensitivity
    pub async fn wait_for_regex(&self, job_id: &str, pattern: &Regex) -> Result<String, WaitError> {
        let deadline = Instant::now() + self.config.timeout;

        match timeout_at(deadline, self.watch(job_id, pattern)).await {
            Ok(output) => {
                info!("Output of job {} matched {}", job_id, pattern);
                Ok(output)
            }
            Err(_) => Err(WaitError::OutputMismatch {
                job_id: job_id.to_string(),
                pattern: pattern.as_str().to_string(),
            }),
        }
    }

    /// Re-open the stream until it matches; only the caller's deadline stops it
    async fn watch(&self, job_id: &str, pattern: &Regex) -> String {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!("Monitor {} (attempt {})", job_id, attempt);

            if let Some(output) = self.read_once(job_id, pattern).await {
                return output;
            }
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }

    /// Read one stream from the start, returning the output if it matched
    async fn read_once(&self, job_id: &str, pattern: &Regex) -> Option<String> {
        let mut stream = match self.jobs.monitor(job_id).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to open output of job {}: {}", job_id, e);
                return None;
            }
        };

        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) if bytes.is_empty() => break,
                Ok(bytes) => {
                    buffer.extend_from_slice(&bytes);
                    let text = String::from_utf8_lossy(&buffer);
                    if pattern.is_match(&text) {
                        return Some(text.into_owned());
                    }
                }
                Err(e) => {
                    warn!("Output of job {} interrupted: {}", job_id, e);
                    break;
                }
            }
        }
        None
    }
}
