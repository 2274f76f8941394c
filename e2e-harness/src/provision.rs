//! Test account provisioning
//!
//! Every step is create-or-get: a failed create is logged and followed by a
//! lookup, so reruns against the same cluster reuse the accounts a previous
//! run made. Only a failed lookup is an error.

use anyhow::Context;
use e2e_client::PlatformClient;
use e2e_core::domain::admin::{ClusterUserRole, Project};
use e2e_core::dto::admin::{CreateClusterUser, CreateProject, CreateUser};
use tracing::info;

use crate::config::E2eConfig;

/// Creates test users and their cluster membership
pub struct Provisioner {
    admin: PlatformClient,
    auth: PlatformClient,
    cluster_name: String,
}

impl Provisioner {
    /// # Arguments
    /// * `admin` - client for the admin API, holding an admin token
    /// * `auth` - client for the auth API, holding an admin token
    pub fn new(admin: PlatformClient, auth: PlatformClient, cluster_name: impl Into<String>) -> Self {
        Self {
            admin,
            auth,
            cluster_name: cluster_name.into(),
        }
    }

    pub fn from_config(config: &E2eConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.admin_client()?,
            config.auth_client()?,
            config.cluster_name.clone(),
        ))
    }

    /// Create or find a user, then mint a token for it
    pub async fn ensure_user(&self, name: &str) -> anyhow::Result<String> {
        if let Err(e) = self.admin.create_user(CreateUser::test_user(name)).await {
            info!("User {} creation failed: {}", name, e);
            self.admin
                .get_user(name)
                .await
                .with_context(|| format!("User {} could not be created or found", name))?;
        }

        self.auth
            .user_token(name)
            .await
            .with_context(|| format!("Failed to mint a token for user {}", name))
    }

    /// Create or find the user's membership in the cluster
    pub async fn ensure_cluster_user(&self, name: &str) -> anyhow::Result<()> {
        let req = CreateClusterUser {
            user_name: name.to_string(),
            role: ClusterUserRole::User,
        };
        if let Err(e) = self.admin.create_cluster_user(&self.cluster_name, req).await {
            info!("Cluster user {} creation failed: {}", name, e);
            self.admin
                .get_cluster_user(&self.cluster_name, name)
                .await
                .with_context(|| {
                    format!(
                        "User {} is not a member of cluster {}",
                        name, self.cluster_name
                    )
                })?;
        }
        Ok(())
    }
}

/// Create or find the user's default project and return its name
///
/// `client` is an admin API client acting as the user itself.
pub async fn ensure_project(
    client: &PlatformClient,
    cluster_name: &str,
    user_name: &str,
) -> anyhow::Result<String> {
    let name = Project::default_name(user_name);
    let req = CreateProject {
        name: name.clone(),
        org_name: None,
    };

    if let Err(e) = client.create_project(cluster_name, req).await {
        info!("Project {} creation failed: {}", name, e);
        client
            .get_project(cluster_name, &name)
            .await
            .with_context(|| format!("Project {} could not be created or found", name))?;
    }
    Ok(name)
}
