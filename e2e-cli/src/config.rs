//! Configuration module
//!
//! Turns the global command-line flags into a harness configuration.

use anyhow::{Context, Result};
use e2e_harness::E2eConfig;
use std::time::Duration;
use tracing::debug;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Platform URL
    pub url: String,
    /// API URL override
    pub api_url: Option<String>,
    /// Registry URL override
    pub registry_url: Option<String>,
    /// User token; only platform commands need it
    pub token: Option<String>,
    pub cluster_name: String,
    pub wait_attempts: u32,
    pub poll_interval_ms: u64,
    pub output_timeout_secs: u64,
    pub output_sleep_secs: u64,
    pub network_timeout_secs: u64,
}

impl Config {
    /// Harness configuration for commands that talk to the platform
    pub fn harness(&self) -> Result<E2eConfig> {
        let token = self
            .token
            .clone()
            .context("A user token is required: pass --token or set CLIENT_TEST_E2E_USER_TOKEN")?;
        let mut config = E2eConfig::new(&self.url, Some(token), self.cluster_name.clone())?;
        if let Some(api_url) = &self.api_url {
            config = config.with_api_url(api_url)?;
        }
        if let Some(registry_url) = &self.registry_url {
            config.registry_url = registry_url.trim_end_matches('/').to_string();
        }
        config.wait.max_attempts = self.wait_attempts;
        config.wait.poll_interval = Duration::from_millis(self.poll_interval_ms);
        config.output.timeout = Duration::from_secs(self.output_timeout_secs);
        config.output.retry_delay = Duration::from_secs(self.output_sleep_secs);
        config.network_timeout = Duration::from_secs(self.network_timeout_secs);

        config.validate()?;
        debug!("Platform API {}, registry {}", config.api_url, config.registry_url);
        Ok(config)
    }
}
