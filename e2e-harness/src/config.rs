//! Harness configuration
//!
//! Defines where the platform lives, which credentials the suites use and
//! how long the waiters keep trying. Every budget is an explicit value handed
//! to the component that needs it.

use anyhow::Context;
use e2e_client::PlatformClient;
use reqwest::Url;
use std::time::Duration;

use crate::identity;
use crate::provision::Provisioner;

const DEFAULT_BASE_URL: &str = "https://api.dev.apolo.us";

/// Budget of the job status waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Maximum number of status queries
    pub max_attempts: u32,
    /// Delay between consecutive queries
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Budget of the job output waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Wall-clock budget for the pattern to show up
    pub timeout: Duration,
    /// Pause before re-opening a stream that ended or failed
    pub retry_delay: Duration,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5 * 60),
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// End-to-end suite configuration
#[derive(Debug, Clone)]
pub struct E2eConfig {
    /// Platform API base URL (e.g., "https://api.dev.apolo.us/api/v1")
    pub api_url: String,

    /// Cluster container registry URL
    pub registry_url: String,

    /// Admin API URL (e.g., "https://api.dev.apolo.us/apis/admin/v1")
    pub admin_url: String,

    /// Auth API URL that mints user tokens
    pub auth_url: String,

    /// Token of the primary test user; provisioned when unset
    pub token: Option<String>,

    /// Token of the secondary user used by isolation suites
    pub alt_token: Option<String>,

    /// Service token allowed to create users, cluster users and tokens
    pub admin_token: Option<String>,

    /// Cluster the suites run against
    pub cluster_name: String,

    /// Which provisioned user this config acts as (1 primary, 2 secondary)
    pub user_index: u32,

    /// Per-request timeout of the HTTP client
    pub network_timeout: Duration,

    pub wait: WaitConfig,

    pub output: OutputConfig,
}

impl E2eConfig {
    /// Creates a new configuration with defaults derived from the base URL
    pub fn new(
        base_url: &str,
        token: Option<String>,
        cluster_name: String,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            api_url: api_url_from(base_url)?,
            registry_url: registry_url_from(base_url)?,
            admin_url: admin_url_from(base_url)?,
            auth_url: api_url_from(base_url)?,
            token,
            alt_token: None,
            admin_token: None,
            cluster_name,
            user_index: 1,
            network_timeout: Duration::from_secs(3 * 60),
            wait: WaitConfig::default(),
            output: OutputConfig::default(),
        })
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - CLUSTER_NAME (required)
    /// - CLIENT_TEST_E2E_USER_TOKEN or CLIENT_TEST_E2E_ADMIN_TOKEN (at least one)
    /// - CLIENT_TEST_E2E_URI (optional, default: https://api.dev.apolo.us)
    /// - CLIENT_TEST_E2E_API_URI (optional, overrides the API host)
    /// - CLIENT_TEST_E2E_ADMIN_URI (optional, overrides the admin API host)
    /// - CLIENT_TEST_E2E_AUTH_URI (optional, overrides the auth API host)
    /// - CLIENT_TEST_E2E_REGISTRY_URI (optional, default: registry.<base host>)
    /// - CLIENT_TEST_E2E_USER_TOKEN_ALT (optional)
    /// - E2E_JOB_WAIT_ATTEMPTS (optional, default: 60)
    /// - E2E_JOB_POLL_INTERVAL_MS (optional, default: 1000)
    /// - E2E_JOB_OUTPUT_TIMEOUT (optional, seconds, default: 300)
    /// - E2E_JOB_OUTPUT_SLEEP (optional, seconds, default: 2)
    /// - E2E_NETWORK_TIMEOUT (optional, seconds, default: 180)
    pub fn from_env() -> anyhow::Result<Self> {
        let token = std::env::var("CLIENT_TEST_E2E_USER_TOKEN").ok();
        let admin_token = std::env::var("CLIENT_TEST_E2E_ADMIN_TOKEN").ok();
        if token.is_none() && admin_token.is_none() {
            anyhow::bail!(
                "neither CLIENT_TEST_E2E_USER_TOKEN nor CLIENT_TEST_E2E_ADMIN_TOKEN is set"
            );
        }

        let cluster_name = std::env::var("CLUSTER_NAME")
            .map_err(|_| anyhow::anyhow!("CLUSTER_NAME environment variable not set"))?;

        let base_url =
            std::env::var("CLIENT_TEST_E2E_URI").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let mut config = Self::new(&base_url, token, cluster_name)?;

        if let Ok(api_uri) = std::env::var("CLIENT_TEST_E2E_API_URI") {
            config = config.with_api_url(&api_uri)?;
        }
        if let Ok(admin_uri) = std::env::var("CLIENT_TEST_E2E_ADMIN_URI") {
            config.admin_url = admin_url_from(&admin_uri)?;
        }
        if let Ok(auth_uri) = std::env::var("CLIENT_TEST_E2E_AUTH_URI") {
            config.auth_url = api_url_from(&auth_uri)?;
        }
        if let Ok(registry_uri) = std::env::var("CLIENT_TEST_E2E_REGISTRY_URI") {
            config.registry_url = registry_uri.trim_end_matches('/').to_string();
        }
        config.alt_token = std::env::var("CLIENT_TEST_E2E_USER_TOKEN_ALT").ok();
        config.admin_token = admin_token;

        Ok(config.with_env_budgets())
    }

    /// Serve the API from a different host than the platform URL
    pub fn with_api_url(mut self, api_uri: &str) -> anyhow::Result<Self> {
        self.api_url = api_url_from(api_uri)?;
        Ok(self)
    }

    /// Apply the budget and timeout overrides from the environment
    ///
    /// Reads the `E2E_*` variables listed on [`E2eConfig::from_env`]; unset
    /// or unparsable values keep the current setting.
    pub fn with_env_budgets(mut self) -> Self {
        if let Some(attempts) = env_parse::<u32>("E2E_JOB_WAIT_ATTEMPTS") {
            self.wait.max_attempts = attempts;
        }
        if let Some(millis) = env_parse::<u64>("E2E_JOB_POLL_INTERVAL_MS") {
            self.wait.poll_interval = Duration::from_millis(millis);
        }
        if let Some(secs) = env_parse::<u64>("E2E_JOB_OUTPUT_TIMEOUT") {
            self.output.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("E2E_JOB_OUTPUT_SLEEP") {
            self.output.retry_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("E2E_NETWORK_TIMEOUT") {
            self.network_timeout = Duration::from_secs(secs);
        }
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.token.as_deref().is_some_and(str::is_empty) {
            anyhow::bail!("token cannot be empty");
        }

        if self.token.is_none() && self.admin_token.is_none() {
            anyhow::bail!("either a user token or an admin token is required");
        }

        if self.cluster_name.is_empty() {
            anyhow::bail!("cluster_name cannot be empty");
        }

        for (name, url) in [
            ("api_url", &self.api_url),
            ("registry_url", &self.registry_url),
            ("admin_url", &self.admin_url),
            ("auth_url", &self.auth_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.wait.max_attempts == 0 {
            anyhow::bail!("wait.max_attempts must be greater than 0");
        }

        if self.wait.poll_interval.is_zero() {
            anyhow::bail!("wait.poll_interval must be greater than 0");
        }

        if self.output.timeout.is_zero() {
            anyhow::bail!("output.timeout must be greater than 0");
        }

        if self.network_timeout.is_zero() {
            anyhow::bail!("network_timeout must be greater than 0");
        }

        Ok(())
    }

    /// Name of the user this config acts as
    ///
    /// Read from the token claims. Without a token this is the name the
    /// suites provision for this cluster; an opaque token falls back to the
    /// same name.
    pub fn user_name(&self) -> String {
        self.token
            .as_deref()
            .and_then(identity::user_name_from_token)
            .unwrap_or_else(|| identity::default_user_name(&self.cluster_name, self.user_index))
    }

    /// Configuration acting as the secondary user
    ///
    /// `None` when there is neither an alternate token nor an admin token
    /// to provision the alternate user with.
    pub fn alt(&self) -> Option<Self> {
        if self.alt_token.is_none() && self.admin_token.is_none() {
            return None;
        }
        let mut config = self.clone();
        config.token = self.alt_token.clone();
        config.alt_token = None;
        config.user_index = 2;
        Some(config)
    }

    /// Make sure the user exists, is a member of the cluster and has a token
    ///
    /// A configured user token is used as is. Otherwise the admin token
    /// creates (or finds) the user and its cluster membership and mints a
    /// token for it.
    pub async fn provision(mut self) -> anyhow::Result<Self> {
        if self.token.is_some() {
            return Ok(self);
        }

        let user_name = self.user_name();
        let provisioner = Provisioner::from_config(&self)?;
        let token = provisioner.ensure_user(&user_name).await?;
        provisioner.ensure_cluster_user(&user_name).await?;

        self.token = Some(token);
        Ok(self)
    }

    fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.network_timeout)
            .read_timeout(self.network_timeout)
            .build()
            .context("Failed to build HTTP client")
    }

    fn user_token(&self) -> anyhow::Result<&str> {
        self.token
            .as_deref()
            .context("No user token; set CLIENT_TEST_E2E_USER_TOKEN or provision the user first")
    }

    fn admin_token(&self) -> anyhow::Result<&str> {
        self.admin_token
            .as_deref()
            .context("CLIENT_TEST_E2E_ADMIN_TOKEN is required to provision test users")
    }

    /// Builds an authenticated platform client
    pub fn client(&self) -> anyhow::Result<PlatformClient> {
        Ok(
            PlatformClient::with_client(self.api_url.clone(), self.http_client()?)
                .with_token(self.user_token()?)
                .with_registry(self.registry_url.clone()),
        )
    }

    /// Admin API client acting as the test user, for its own projects
    pub fn project_client(&self) -> anyhow::Result<PlatformClient> {
        Ok(
            PlatformClient::with_client(self.admin_url.clone(), self.http_client()?)
                .with_token(self.user_token()?),
        )
    }

    /// Admin API client acting with the admin token
    pub fn admin_client(&self) -> anyhow::Result<PlatformClient> {
        Ok(
            PlatformClient::with_client(self.admin_url.clone(), self.http_client()?)
                .with_token(self.admin_token()?),
        )
    }

    /// Auth API client acting with the admin token
    pub fn auth_client(&self) -> anyhow::Result<PlatformClient> {
        Ok(
            PlatformClient::with_client(self.auth_url.clone(), self.http_client()?)
                .with_token(self.admin_token()?),
        )
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}

/// API root under a platform URL: same origin, path `/api/v1`
fn api_url_from(base_url: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(base_url).with_context(|| format!("Invalid URL: {}", base_url))?;
    url.set_path("api/v1");
    url.set_query(None);
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Admin API root under a platform URL: same origin, path `/apis/admin/v1`
fn admin_url_from(base_url: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(base_url).with_context(|| format!("Invalid URL: {}", base_url))?;
    url.set_path("apis/admin/v1");
    url.set_query(None);
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Registry next to the API host: `api.example.com` becomes `registry.example.com`
fn registry_url_from(base_url: &str) -> anyhow::Result<String> {
    let url = Url::parse(base_url).with_context(|| format!("Invalid URL: {}", base_url))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("URL has no host: {}", base_url))?;
    let domain = host.strip_prefix("api.").unwrap_or(host);
    Ok(format!("{}://registry.{}", url.scheme(), domain))
}
