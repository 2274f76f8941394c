//! Blob storage DTOs

use serde::{Deserialize, Serialize};

/// Request to create a bucket
///
/// Without a name the platform generates one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
