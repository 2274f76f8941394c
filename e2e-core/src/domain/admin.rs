//! Accounts the suites run as: users, their cluster membership and projects

use serde::{Deserialize, Serialize};
use std::fmt;

/// A platform user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Role of a user inside a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterUserRole {
    User,
    Manager,
    Admin,
}

impl fmt::Display for ClusterUserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            Self::User => "user",
            Self::Manager => "manager",
            Self::Admin => "admin",
        };
        f.write_str(role)
    }
}

/// Membership of a user in a cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterUser {
    pub user_name: String,
    pub cluster_name: String,
    pub role: ClusterUserRole,
}

/// A project inside a cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub cluster_name: String,
    #[serde(default)]
    pub org_name: Option<String>,
}

impl Project {
    /// The project every suite user works in: `<user>-default`
    pub fn default_name(user_name: &str) -> String {
        format!("{}-default", user_name)
    }
}
