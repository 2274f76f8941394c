//! Shared setup for the live platform suites
//!
//! The suites are `#[ignore]`d; run them with `cargo test -- --ignored` once
//! `CLUSTER_NAME` and either `CLIENT_TEST_E2E_USER_TOKEN` or
//! `CLIENT_TEST_E2E_ADMIN_TOKEN` point at a platform.

#![allow(dead_code)]

use e2e_harness::fixtures::JobReaper;
use e2e_harness::{E2eConfig, Helper};
use std::sync::Arc;
use tempfile::TempDir;

pub struct Suite {
    pub config: E2eConfig,
    pub helper: Arc<Helper>,
    pub reaper: JobReaper,
    _tmp: TempDir,
}

/// Platform configuration, or `None` when the environment has none
pub fn config() -> Option<E2eConfig> {
    e2e_harness::init_tracing();

    match E2eConfig::from_env() {
        Ok(config) => {
            if let Err(e) = config.validate() {
                panic!("invalid e2e configuration: {e:#}");
            }
            Some(config)
        }
        Err(e) => {
            eprintln!("skipping: {e:#}");
            None
        }
    }
}

/// Provision the config's user and connect a helper in its default project
pub async fn suite_for(config: E2eConfig) -> Suite {
    let config = config.provision().await.expect("provision test user");
    let tmp = tempfile::tempdir().expect("scratch dir");
    let helper = Arc::new(
        Helper::connect(&config, tmp.path())
            .await
            .expect("helper"),
    );
    Suite {
        reaper: JobReaper::new(helper.clone()),
        helper,
        config,
        _tmp: tmp,
    }
}

/// Suite acting as the primary user
pub async fn setup() -> Option<Suite> {
    Some(suite_for(config()?).await)
}

impl Suite {
    /// Suite acting as the secondary user, if one is configured
    pub async fn alt(&self) -> Option<Suite> {
        match self.config.alt() {
            Some(config) => Some(suite_for(config).await),
            None => {
                eprintln!(
                    "skipping: neither CLIENT_TEST_E2E_USER_TOKEN_ALT nor CLIENT_TEST_E2E_ADMIN_TOKEN is set"
                );
                None
            }
        }
    }

    pub async fn teardown(self) {
        self.reaper.reap().await.expect("reap jobs");
        self.helper.close().await.expect("remove temporary storage");
    }
}
