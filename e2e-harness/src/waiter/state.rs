//! Job status waiter

use e2e_client::JobsApi;
use e2e_core::domain::job::{JobDescription, JobStatus};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::WaitConfig;
use crate::error::WaitError;

/// What one observation means for a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The expected status was reached (or passed, for pending)
    Reached,
    /// The job settled in a status that rules the expected one out
    Contradiction,
    /// Keep polling
    Continue,
}

/// Judge an observed status against the expected one
///
/// Rules apply in order:
/// 1. equal statuses are reached
/// 2. a failure while not expecting one, or a success while expecting a
///    failure, is a contradiction
/// 3. expecting pending is satisfied by any status past pending
pub fn judge(expected: JobStatus, observed: JobStatus) -> Verdict {
    if observed == expected {
        return Verdict::Reached;
    }
    if (!expected.is_failure() && observed.is_failure())
        || (expected.is_failure() && observed.is_success())
    {
        return Verdict::Contradiction;
    }
    if expected == JobStatus::Pending && observed.is_past_pending() {
        return Verdict::Reached;
    }
    Verdict::Continue
}

/// Polls a job until it reaches an expected status
pub struct JobStateWaiter {
    jobs: Arc<dyn JobsApi>,
    config: WaitConfig,
}

impl JobStateWaiter {
    pub fn new(jobs: Arc<dyn JobsApi>, config: WaitConfig) -> Self {
        Self { jobs, config }
    }

    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    /// Query the job until it reaches `expected`
    ///
    /// Performs at most `max_attempts` status queries, sleeping
    /// `poll_interval` between consecutive ones.
    pub async fn wait(
        &self,
        job_id: &str,
        expected: JobStatus,
    ) -> Result<JobDescription, WaitError> {
        self.poll(job_id, None, expected).await
    }

    /// Like [`wait`](Self::wait), starting from an already observed snapshot
    ///
    /// The snapshot is judged first without a query; polling only starts if
    /// it is not decisive.
    pub async fn wait_from(
        &self,
        job: JobDescription,
        expected: JobStatus,
    ) -> Result<JobDescription, WaitError> {
        let job_id = job.id.clone();
        self.poll(&job_id, Some(job), expected).await
    }

    async fn poll(
        &self,
        job_id: &str,
        initial: Option<JobDescription>,
        expected: JobStatus,
    ) -> Result<JobDescription, WaitError> {
        let mut last = JobStatus::Unknown;
        let mut sleep_first = false;

        if let Some(job) = initial {
            last = job.status;
            match self.settle(job, expected)? {
                Some(job) => return Ok(job),
                None => sleep_first = true,
            }
        }

        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 || sleep_first {
                tokio::time::sleep(self.config.poll_interval).await;
            }

            let job = self.jobs.status(job_id).await?;
            debug!(
                "Wait state {}: {} -> {} (attempt {}/{})",
                expected, job_id, job.status, attempt, self.config.max_attempts
            );
            last = job.status;

            if let Some(job) = self.settle(job, expected)? {
                return Ok(job);
            }
        }

        Err(WaitError::AttemptsExhausted {
            job_id: job_id.to_string(),
            expected,
            last,
            attempts: self.config.max_attempts,
        })
    }

    /// Turn a decisive observation into the wait's outcome
    fn settle(
        &self,
        job: JobDescription,
        expected: JobStatus,
    ) -> Result<Option<JobDescription>, WaitError> {
        match judge(expected, job.status) {
            Verdict::Reached => {
                info!("Job {} reached {} (wanted {})", job.id, job.status, expected);
                Ok(Some(job))
            }
            Verdict::Contradiction => Err(WaitError::ContradictoryState {
                job_id: job.id,
                expected,
                observed: job.status,
            }),
            Verdict::Continue => Ok(None),
        }
    }
}
