//! E2E Harness
//!
//! Test-side helpers for driving the compute platform end to end.
//!
//! Architecture:
//! - Configuration: platform location, credentials and wait budgets from the environment
//! - Provisioning: test users, their cluster membership and default project
//! - Waiters: bounded polling of job status and job output
//! - Helper: per-test facade over the platform client (jobs, storage, buckets)
//! - Local tooling: checksums, shell invocation, the local container engine
//! - Fixtures: job reaping and the secret-serving nginx job used by network suites

pub mod checksum;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod helper;
pub mod identity;
pub mod provision;
pub mod shell;
pub mod waiter;

pub use config::{E2eConfig, OutputConfig, WaitConfig};
pub use error::{ProbeError, ShellError, WaitError};
pub use helper::{Helper, RunJobOptions};
pub use provision::Provisioner;
pub use waiter::{JobStateWaiter, OutputWaiter};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "platform_e2e=info,e2e_harness=info,e2e_client=info";

/// Install the fmt subscriber, honoring `RUST_LOG`
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
