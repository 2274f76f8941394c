//! Platform E2E CLI
//!
//! Drives single harness operations against a platform from the shell:
//! submit and wait for jobs, watch their output, and check storage content.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "platform-e2e")]
#[command(about = "Compute platform end-to-end toolkit", long_about = None)]
struct Cli {
    /// Platform URL
    #[arg(long, env = "CLIENT_TEST_E2E_URI", default_value = "https://api.dev.apolo.us")]
    url: String,

    /// API URL, when it differs from the platform URL
    #[arg(long, env = "CLIENT_TEST_E2E_API_URI")]
    api_url: Option<String>,

    /// Container registry URL
    #[arg(long, env = "CLIENT_TEST_E2E_REGISTRY_URI")]
    registry_url: Option<String>,

    /// User token; required by the job and storage commands
    #[arg(long, env = "CLIENT_TEST_E2E_USER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Cluster name
    #[arg(long, env = "CLUSTER_NAME", default_value = "default")]
    cluster: String,

    /// Maximum number of job status queries per wait
    #[arg(long, env = "E2E_JOB_WAIT_ATTEMPTS", default_value_t = 60)]
    wait_attempts: u32,

    /// Milliseconds between job status queries
    #[arg(long, env = "E2E_JOB_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Seconds to wait for job output to match
    #[arg(long, env = "E2E_JOB_OUTPUT_TIMEOUT", default_value_t = 300)]
    output_timeout: u64,

    /// Seconds before re-opening a job output stream
    #[arg(long, env = "E2E_JOB_OUTPUT_SLEEP", default_value_t = 2)]
    output_sleep: u64,

    /// Per-request network timeout in seconds
    #[arg(long, env = "E2E_NETWORK_TIMEOUT", default_value_t = 180)]
    network_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    e2e_harness::init_tracing();

    let config = Config {
        url: cli.url,
        api_url: cli.api_url,
        registry_url: cli.registry_url,
        token: cli.token,
        cluster_name: cli.cluster,
        wait_attempts: cli.wait_attempts,
        poll_interval_ms: cli.poll_interval_ms,
        output_timeout_secs: cli.output_timeout,
        output_sleep_secs: cli.output_sleep,
        network_timeout_secs: cli.network_timeout,
    };

    handle_command(cli.command, &config).await
}
