//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Job execution status as reported by the platform
///
/// Transitions are owned by the platform; a locally held value is only the
/// last observation and may be stale as soon as it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Suspended,
    Running,
    Succeeded,
    Cancelled,
    Failed,
    Unknown,
}

/// Outcome class of a status
///
/// Waiters decide contradictions by comparing classes, never individual
/// statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The job may still move to another status
    Transient,
    /// Terminal, the job completed successfully
    Success,
    /// Terminal, the job failed
    Failure,
    /// Terminal, the job was stopped from outside
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Pending,
        JobStatus::Suspended,
        JobStatus::Running,
        JobStatus::Succeeded,
        JobStatus::Cancelled,
        JobStatus::Failed,
        JobStatus::Unknown,
    ];

    pub fn class(self) -> StatusClass {
        match self {
            JobStatus::Pending | JobStatus::Suspended | JobStatus::Running | JobStatus::Unknown => {
                StatusClass::Transient
            }
            JobStatus::Succeeded => StatusClass::Success,
            JobStatus::Failed => StatusClass::Failure,
            JobStatus::Cancelled => StatusClass::Cancelled,
        }
    }

    pub fn is_failure(self) -> bool {
        self.class() == StatusClass::Failure
    }

    pub fn is_success(self) -> bool {
        self.class() == StatusClass::Success
    }

    pub fn is_terminal(self) -> bool {
        self.class() != StatusClass::Transient
    }

    /// Whether the job has left the pending phase
    ///
    /// A job that is running or has finished (either way) has necessarily
    /// been pending before. Cancelled is excluded: a job can be cancelled
    /// while still queued.
    pub fn is_past_pending(self) -> bool {
        matches!(
            self,
            JobStatus::Running | JobStatus::Succeeded | JobStatus::Failed
        )
    }

    /// Wire name of the status
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Suspended => "suspended",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| format!("unknown job status '{}'", s))
    }
}

/// Snapshot of a job as returned by the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescription {
    pub id: String,
    pub owner: String,
    pub cluster_name: String,
    pub status: JobStatus,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub history: JobStatusHistory,
    pub container: Container,
    #[serde(default)]
    pub http_url: Option<Url>,
    #[serde(default)]
    pub internal_hostname: Option<String>,
    #[serde(default)]
    pub internal_hostname_named: Option<String>,
    #[serde(default)]
    pub is_preemptible: bool,
}

/// Status history attached to a job snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusHistory {
    pub status: JobStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exit_code: Option<i32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Container specification of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub image: String,
    #[serde(default)]
    pub command: Option<String>,
    pub resources: Resources,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub http: Option<HttpPort>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Container {
    pub fn new(image: impl Into<String>, resources: Resources) -> Self {
        Self {
            image: image.into(),
            command: None,
            resources,
            volumes: Vec::new(),
            http: None,
            env: HashMap::new(),
        }
    }
}

/// Compute resources requested by a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu: f64,
    /// Memory in bytes
    pub memory: u64,
    #[serde(default)]
    pub gpu: Option<u32>,
    #[serde(default)]
    pub gpu_model: Option<String>,
    #[serde(default)]
    pub shm: bool,
}

impl Resources {
    pub fn new(cpu: f64, memory: u64) -> Self {
        Self {
            cpu,
            memory,
            gpu: None,
            gpu_model: None,
            shm: true,
        }
    }
}

impl Default for Resources {
    /// The smallest footprint the platform schedules quickly: 0.1 CPU, 20 MiB
    fn default() -> Self {
        Self::new(0.1, 20 * 1024 * 1024)
    }
}

/// Exposed HTTP port of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpPort {
    pub port: u16,
    #[serde(default = "default_requires_auth")]
    pub requires_auth: bool,
}

fn default_requires_auth() -> bool {
    true
}

impl HttpPort {
    pub fn new(port: u16, requires_auth: bool) -> Self {
        Self {
            port,
            requires_auth,
        }
    }
}

/// Storage volume mounted into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub storage_uri: Url,
    pub container_path: String,
    #[serde(default)]
    pub read_only: bool,
}
