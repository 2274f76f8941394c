//! Storage command handlers
//!
//! Checksums of platform storage files and local files, compared the same
//! way the storage suites compare them.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use e2e_harness::checksum;
use reqwest::Url;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Storage subcommands
#[derive(Subcommand)]
pub enum StorageCommands {
    /// SHA-1 of a storage file
    Checksum {
        /// `storage://owner/path`, or a path under the caller's storage
        path: String,
    },
    /// Create a storage directory and its parents
    Mkdir { path: String },
}

/// Local subcommands
#[derive(Subcommand)]
pub enum LocalCommands {
    /// SHA-1 of a local file
    Checksum { file: PathBuf },
}

pub async fn handle_storage_command(command: StorageCommands, config: &Config) -> Result<()> {
    let harness = config.harness()?;
    let client = harness.client()?;
    let user = harness.user_name();

    match command {
        StorageCommands::Checksum { path } => {
            let uri = storage_uri(&user, &path)?;
            let scratch = tempfile::tempdir()?;
            let local = scratch.path().join("download.tmp");

            client
                .download_file(&uri, &local)
                .await
                .with_context(|| format!("Failed to download {}", uri))?;
            let checksum = checksum::file_checksum(&local).await?;

            println!("{}  {}", checksum.green(), uri);
            Ok(())
        }
        StorageCommands::Mkdir { path } => {
            let uri = storage_uri(&user, &path)?;
            client.mkdirs(&uri).await?;
            println!("{} Created {}", "✓".green(), uri.as_str().cyan());
            Ok(())
        }
    }
}

pub async fn handle_local_command(command: LocalCommands) -> Result<()> {
    match command {
        LocalCommands::Checksum { file } => {
            let checksum = local_checksum(&file).await?;
            println!("{}  {}", checksum.green(), file.display());
            Ok(())
        }
    }
}

async fn local_checksum(file: &Path) -> Result<String> {
    checksum::file_checksum(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

/// Resolve a command-line path to a storage URI
fn storage_uri(user: &str, path: &str) -> Result<Url> {
    if path.starts_with("storage:") {
        return Url::parse(path).with_context(|| format!("Invalid storage URI: {}", path));
    }
    let uri = format!("storage://{}/{}", user, path.trim_start_matches('/'));
    Url::parse(&uri).with_context(|| format!("Invalid storage path: {}", path))
}
