//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod storage;

pub use job::JobCommands;
pub use storage::{LocalCommands, StorageCommands};

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Platform storage
    Storage {
        #[command(subcommand)]
        command: StorageCommands,
    },
    /// Local files
    Local {
        #[command(subcommand)]
        command: LocalCommands,
    },
}

/// Route a command to its handler
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Storage { command } => storage::handle_storage_command(command, config).await,
        Commands::Local { command } => storage::handle_local_command(command).await,
    }
}
