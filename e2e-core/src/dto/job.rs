//! Job DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::{Container, JobStatus};

/// Request to submit a new job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunJob {
    pub container: Container,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_preemptible: bool,
    /// Project the job belongs to; the user's current project when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

impl RunJob {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            name: None,
            description: None,
            is_preemptible: false,
            project_name: None,
        }
    }
}

/// Filter for listing jobs
///
/// An empty status set means "any status".
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub statuses: Vec<JobStatus>,
    pub name: Option<String>,
}

impl JobFilter {
    /// Jobs that still occupy the cluster
    pub fn active() -> Self {
        Self {
            statuses: vec![JobStatus::Running, JobStatus::Pending],
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Query pairs for the list endpoint
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query: Vec<_> = self
            .statuses
            .iter()
            .map(|status| ("status", status.as_str().to_string()))
            .collect();
        if let Some(name) = &self.name {
            query.push(("name", name.clone()));
        }
        query
    }
}
