//! Admin and auth endpoints
//!
//! A client pointed at the admin API (`.../apis/admin/v1`) manages users,
//! cluster membership and projects. A client pointed at the auth API
//! (`.../api/v1`) mints user tokens. Both need a token with admin rights,
//! except project calls, which the project's own user may make.

use e2e_core::domain::admin::{ClusterUser, Project, User};
use e2e_core::dto::admin::{CreateClusterUser, CreateProject, CreateUser, UserToken};
use reqwest::Method;
use tracing::info;

use crate::PlatformClient;
use crate::error::Result;

impl PlatformClient {
    // =============================================================================
    // Users
    // =============================================================================

    /// Create a user without adding it to any cluster
    pub async fn create_user(&self, req: CreateUser) -> Result<User> {
        let url = format!("{}/users", self.api_url);
        info!("Create user {}", req.name);
        let response = self
            .request(Method::POST, &url)
            .query(&[("skip_auto_add_to_clusters", "true")])
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn get_user(&self, name: &str) -> Result<User> {
        let url = format!("{}/users/{}", self.api_url, name);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    /// Mint a token acting as `name`
    pub async fn user_token(&self, name: &str) -> Result<String> {
        let url = format!("{}/users/{}/token", self.api_url, name);
        let response = self.request(Method::POST, &url).send().await?;

        let token: UserToken = self.handle_response(response).await?;
        Ok(token.access_token)
    }

    // =============================================================================
    // Cluster users
    // =============================================================================

    pub async fn create_cluster_user(
        &self,
        cluster_name: &str,
        req: CreateClusterUser,
    ) -> Result<ClusterUser> {
        let url = format!("{}/clusters/{}/users", self.api_url, cluster_name);
        info!("Add user {} to cluster {}", req.user_name, cluster_name);
        let response = self.request(Method::POST, &url).json(&req).send().await?;

        self.handle_response(response).await
    }

    pub async fn get_cluster_user(&self, cluster_name: &str, user_name: &str) -> Result<ClusterUser> {
        let url = format!("{}/clusters/{}/users/{}", self.api_url, cluster_name, user_name);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Projects
    // =============================================================================

    pub async fn create_project(&self, cluster_name: &str, req: CreateProject) -> Result<Project> {
        let url = format!("{}/clusters/{}/projects", self.api_url, cluster_name);
        info!("Create project {} in cluster {}", req.name, cluster_name);
        let response = self.request(Method::POST, &url).json(&req).send().await?;

        self.handle_response(response).await
    }

    pub async fn get_project(&self, cluster_name: &str, project_name: &str) -> Result<Project> {
        let url = format!(
            "{}/clusters/{}/projects/{}",
            self.api_url, cluster_name, project_name
        );
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }
}
