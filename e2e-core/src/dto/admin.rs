//! Admin DTOs

use serde::{Deserialize, Serialize};

use crate::domain::admin::ClusterUserRole;

/// Request to create a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

impl CreateUser {
    /// A test user with a placeholder mailbox
    pub fn test_user(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            email: format!("{}@neu.ro", name),
            name,
        }
    }
}

/// Request to add a user to a cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClusterUser {
    pub user_name: String,
    pub role: ClusterUserRole,
}

/// Request to create a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
}

/// Token minted by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserToken {
    pub access_token: String,
}
