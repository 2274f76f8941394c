//! Storage and blob storage domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a storage entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    File,
    Directory,
}

/// Status of a single storage entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStatus {
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default)]
    pub length: u64,
    /// Seconds since the epoch
    #[serde(rename = "modificationTime", default)]
    pub modification_time: i64,
}

impl FileStatus {
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// A blob storage bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// A single object in a bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobEntry {
    pub key: String,
    pub size: u64,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}
