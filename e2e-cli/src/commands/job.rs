//! Job command handlers
//!
//! Submits jobs, waits for their status or output, and shows what the
//! platform reports about them.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use e2e_client::JobsApi;
use e2e_core::domain::job::{HttpPort, JobDescription, JobStatus, Resources, StatusClass};
use e2e_core::dto::job::JobFilter;
use e2e_harness::{Helper, RunJobOptions};
use regex::RegexBuilder;

use crate::config::Config;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a job and wait for a status
    Run {
        /// Container image
        image: String,

        /// Command to run in the container
        command: Option<String>,

        /// Status to wait for after submission
        #[arg(long, default_value = "running", value_parser = parse_status)]
        wait: JobStatus,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// CPU cores
        #[arg(long, default_value_t = 0.1)]
        cpu: f64,

        /// Memory in MiB
        #[arg(long, default_value_t = 20)]
        memory_mb: u64,

        /// Container port to forward through the ingress
        #[arg(long)]
        http_port: Option<u16>,

        /// Require authentication on the forwarded port
        #[arg(long, requires = "http_port")]
        http_auth: bool,
    },
    /// Wait until a job reaches a status
    Wait {
        id: String,
        #[arg(value_parser = parse_status)]
        status: JobStatus,
    },
    /// Wait until a job's output matches a regular expression
    Output {
        id: String,
        pattern: String,

        #[arg(short, long)]
        ignore_case: bool,
    },
    /// Kill a job
    Kill { id: String },
    /// Show job details
    Status { id: String },
    /// List jobs
    List {
        /// Only jobs in these statuses (default: running and pending)
        #[arg(long, value_delimiter = ',', value_parser = parse_status)]
        status: Vec<JobStatus>,
    },
}

fn parse_status(s: &str) -> Result<JobStatus, String> {
    s.parse()
}

fn mib_to_bytes(mib: u64) -> Result<u64> {
    mib.checked_mul(1024 * 1024)
        .with_context(|| format!("--memory-mb {} is too large", mib))
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let harness = config.harness()?;
    let scratch = tempfile::tempdir()?;
    let helper = Helper::from_config(&harness, scratch.path())?;

    match command {
        JobCommands::Run {
            image,
            command,
            wait,
            name,
            description,
            cpu,
            memory_mb,
            http_port,
            http_auth,
        } => {
            let mut options = RunJobOptions::default()
                .wait_for(wait)
                .with_resources(Resources::new(cpu, mib_to_bytes(memory_mb)?));
            options.name = name;
            options.description = description;
            if let Some(port) = http_port {
                options = options.with_http(HttpPort::new(port, http_auth));
            }
            run_job(&helper, &image, command.as_deref(), options).await
        }
        JobCommands::Wait { id, status } => wait_job(&helper, &id, status).await,
        JobCommands::Output {
            id,
            pattern,
            ignore_case,
        } => wait_output(&helper, &id, &pattern, ignore_case).await,
        JobCommands::Kill { id } => kill_job(&helper, &id).await,
        JobCommands::Status { id } => {
            let job = helper.client().status(&id).await?;
            print_job_details(&job);
            Ok(())
        }
        JobCommands::List { status } => list_jobs(&helper, status).await,
    }
}

async fn run_job(
    helper: &Helper,
    image: &str,
    command: Option<&str>,
    options: RunJobOptions,
) -> Result<()> {
    let wait = options.wait_state;
    println!("{} {}", "Submitting".bold(), image.cyan());

    let job = helper.run_job(image, command, options).await?;

    println!(
        "{} Job {} reached {}",
        "✓".green(),
        job.id.cyan(),
        colorize_status(job.status)
    );
    if job.status != wait {
        println!("  (waited for {})", wait.to_string().dimmed());
    }
    print_job_details(&job);
    Ok(())
}

async fn wait_job(helper: &Helper, id: &str, status: JobStatus) -> Result<()> {
    println!("Waiting for job {} to be {}...", id.cyan(), status);
    let job = helper.wait_job_state(id, status).await?;
    println!(
        "{} Job {} is {}",
        "✓".green(),
        job.id.cyan(),
        colorize_status(job.status)
    );
    Ok(())
}

async fn wait_output(helper: &Helper, id: &str, pattern: &str, ignore_case: bool) -> Result<()> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()?;

    println!("Watching output of job {} for {}...", id.cyan(), pattern.yellow());
    let output = helper.check_job_output_regex(id, &regex).await?;

    println!("{} Output matched", "✓".green());
    println!("{}", "─".repeat(80).dimmed());
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    println!("{}", "─".repeat(80).dimmed());
    Ok(())
}

async fn kill_job(helper: &Helper, id: &str) -> Result<()> {
    match helper.client().kill(id).await {
        Ok(()) => println!("{} Kill requested for job {}", "✓".green(), id.cyan()),
        Err(e) if e.is_not_found() => {
            println!("{}", format!("Job {} not found.", id).yellow())
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn list_jobs(helper: &Helper, statuses: Vec<JobStatus>) -> Result<()> {
    let filter = if statuses.is_empty() {
        JobFilter::active()
    } else {
        JobFilter {
            statuses,
            name: None,
        }
    };
    let jobs = helper.client().list(&filter).await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Print a job summary
fn print_job_summary(job: &JobDescription) {
    println!("  {} Job {}", "▸".cyan(), job.id.dimmed());
    if let Some(name) = &job.name {
        println!("    Name:     {}", name);
    }
    println!("    Status:   {}", colorize_status(job.status));
    println!("    Image:    {}", job.container.image.dimmed());
    println!(
        "    Created:  {}",
        job.history
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
fn print_job_details(job: &JobDescription) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.cyan());
    println!("  Owner:       {}", job.owner);
    println!("  Cluster:     {}", job.cluster_name.dimmed());
    println!("  Status:      {}", colorize_status(job.status));
    if !job.history.reason.is_empty() {
        println!("  Reason:      {}", job.history.reason.yellow());
    }
    println!("  Image:       {}", job.container.image);
    if let Some(command) = &job.container.command {
        println!("  Command:     {}", command.dimmed());
    }
    println!(
        "  Created:     {}",
        job.history.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(started) = job.history.started_at {
        println!("  Started:     {}", started.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(finished) = job.history.finished_at {
        println!("  Finished:    {}", finished.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = job.history.started_at {
            let duration = finished.signed_duration_since(started);
            println!("  Duration:    {}s", duration.num_seconds());
        }
    }
    if let Some(exit_code) = job.history.exit_code {
        println!("  Exit Code:   {}", exit_code);
    }
    if let Some(url) = &job.http_url {
        println!("  HTTP URL:    {}", url.as_str().cyan());
    }
    if let Some(hostname) = &job.internal_hostname {
        println!("  Internal:    {}", hostname);
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let text = status.to_string();
    match status.class() {
        StatusClass::Success => text.green(),
        StatusClass::Failure => text.red(),
        StatusClass::Cancelled => text.dimmed(),
        StatusClass::Transient if status == JobStatus::Running => text.cyan(),
        StatusClass::Transient => text.yellow(),
    }
}
