//! Error types for the harness

use e2e_client::ClientError;
use e2e_core::domain::job::JobStatus;
use thiserror::Error;

/// Failures of the job waiters
#[derive(Debug, Error)]
pub enum WaitError {
    /// The job settled in a status that rules out the expected one
    #[error("wait for {expected} on job {job_id} failed: job is {observed}")]
    ContradictoryState {
        job_id: String,
        expected: JobStatus,
        observed: JobStatus,
    },

    /// The attempt budget ran out before the expected status was seen
    #[error("job {job_id} did not reach {expected} after {attempts} attempt(s), last status: {last}")]
    AttemptsExhausted {
        job_id: String,
        expected: JobStatus,
        last: JobStatus,
        attempts: u32,
    },

    /// The output budget ran out before the pattern matched
    #[error("output of job {job_id} does not satisfy expected pattern: {pattern}")]
    OutputMismatch { job_id: String, pattern: String },

    #[error("invalid output pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Failures of an HTTP probe against a job endpoint
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("server at {url} returned {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("probe request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Failures of a local command
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed: exit_code={exit_code}, stdout='{stdout}', stderr='{stderr}'")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
}
