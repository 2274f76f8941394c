//! In-memory `JobsApi` for waiter tests

use async_trait::async_trait;
use chrono::Utc;
use e2e_client::{ClientError, JobsApi, OutputStream, Result};
use e2e_core::domain::job::{Container, JobDescription, JobStatus, JobStatusHistory, Resources};
use e2e_core::dto::job::{JobFilter, RunJob};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builds a job snapshot with the given status
pub fn job(id: &str, status: JobStatus) -> JobDescription {
    JobDescription {
        id: id.to_string(),
        owner: "tester".to_string(),
        cluster_name: "default".to_string(),
        status,
        name: None,
        description: None,
        history: JobStatusHistory {
            status,
            reason: String::new(),
            description: String::new(),
            exit_code: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        },
        container: Container::new("ubuntu:latest", Resources::default()),
        http_url: None,
        internal_hostname: None,
        internal_hostname_named: None,
        is_preemptible: false,
    }
}

/// One opening of the output stream
pub enum Script {
    /// Yields the chunks, then ends
    Chunks(Vec<&'static str>),
    /// Yields the chunks, then never produces another item
    Stall(Vec<&'static str>),
    /// Opening the stream fails
    OpenError,
}

/// Replays scripted statuses and output streams
///
/// The last status is repeated once the script runs out; so is the last
/// output script.
pub struct ScriptedJobs {
    statuses: Mutex<VecDeque<JobStatus>>,
    fail_status: bool,
    outputs: Mutex<VecDeque<Script>>,
    status_queries: AtomicUsize,
    opened: AtomicUsize,
    pulled: Arc<AtomicUsize>,
}

impl ScriptedJobs {
    fn build(statuses: Vec<JobStatus>, outputs: Vec<Script>, fail_status: bool) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            fail_status,
            outputs: Mutex::new(outputs.into()),
            status_queries: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
            pulled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_statuses(statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        Self::build(statuses.into_iter().collect(), Vec::new(), false)
    }

    pub fn with_outputs(outputs: impl IntoIterator<Item = Script>) -> Self {
        Self::build(Vec::new(), outputs.into_iter().collect(), false)
    }

    pub fn failing_status() -> Self {
        Self::build(Vec::new(), Vec::new(), true)
    }

    /// Number of status queries served
    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    /// Number of output streams opened
    pub fn streams_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of output chunks handed out across all streams
    pub fn chunks_pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> JobStatus {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().copied().unwrap_or(JobStatus::Unknown)
        }
    }

    fn next_script(&self) -> Script {
        let mut outputs = self.outputs.lock().unwrap();
        if outputs.len() > 1 {
            return outputs.pop_front().unwrap();
        }
        match outputs.front() {
            Some(Script::Chunks(chunks)) => Script::Chunks(chunks.clone()),
            Some(Script::Stall(chunks)) => Script::Stall(chunks.clone()),
            Some(Script::OpenError) => Script::OpenError,
            None => Script::Chunks(Vec::new()),
        }
    }

    fn counted(&self, chunks: Vec<&'static str>) -> futures::stream::BoxStream<'static, Result<Vec<u8>>> {
        let pulled = self.pulled.clone();
        futures::stream::iter(chunks)
            .map(move |chunk| {
                pulled.fetch_add(1, Ordering::SeqCst);
                Ok(chunk.as_bytes().to_vec())
            })
            .boxed()
    }
}

#[async_trait]
impl JobsApi for ScriptedJobs {
    async fn submit(&self, req: RunJob) -> Result<JobDescription> {
        let mut job = job("job-submitted", JobStatus::Pending);
        job.container = req.container;
        job.name = req.name;
        Ok(job)
    }

    async fn status(&self, job_id: &str) -> Result<JobDescription> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_status {
            return Err(ClientError::api_error(500, "boom"));
        }
        Ok(job(job_id, self.next_status()))
    }

    async fn kill(&self, _job_id: &str) -> Result<()> {
        Ok(())
    }

    async fn list(&self, _filter: &JobFilter) -> Result<Vec<JobDescription>> {
        Ok(Vec::new())
    }

    async fn monitor(&self, _job_id: &str) -> Result<OutputStream> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        match self.next_script() {
            Script::Chunks(chunks) => Ok(self.counted(chunks)),
            Script::Stall(chunks) => Ok(self
                .counted(chunks)
                .chain(futures::stream::pending())
                .boxed()),
            Script::OpenError => Err(ClientError::api_error(502, "bad gateway")),
        }
    }
}
