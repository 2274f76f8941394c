//! Local container engine
//!
//! Drives a docker-compatible CLI for the registry suites:
//! - Checking the engine is available
//! - Building and tagging test images
//! - Pushing to and pulling from the platform registry
//! - Removing images after a test

use e2e_core::domain::image::{LocalImage, RemoteImage};
use std::path::Path;
use tracing::{info, warn};

use crate::error::ShellError;
use crate::shell::{self, CommandOutput};

/// A docker-compatible command line tool
#[derive(Debug, Clone)]
pub struct ContainerEngine {
    program: String,
}

impl ContainerEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn docker() -> Self {
        Self::new("docker")
    }

    /// Engine named by `E2E_CONTAINER_ENGINE`, docker otherwise
    pub fn from_env() -> Self {
        std::env::var("E2E_CONTAINER_ENGINE")
            .map(Self::new)
            .unwrap_or_else(|_| Self::docker())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput, ShellError> {
        shell::run(&self.program, args).await
    }

    /// Checks the engine is installed and answering
    pub async fn check_available(&self) -> Result<String, ShellError> {
        let output = self.run(&["--version"]).await?;
        let version = output.stdout.trim().to_string();
        info!("Container engine is available: {}", version);
        Ok(version)
    }

    /// Build an image from a context directory
    pub async fn build(
        &self,
        context_dir: &Path,
        image: &LocalImage,
        build_args: &[(&str, &str)],
    ) -> Result<(), ShellError> {
        let tag = image.to_string();
        let context = context_dir.to_string_lossy();
        info!("Build image {}", tag);

        let build_args: Vec<String> = build_args
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();

        let mut args = vec!["build", "-t", tag.as_str()];
        for arg in &build_args {
            args.push("--build-arg");
            args.push(arg.as_str());
        }
        args.push(context.as_ref());

        self.run(&args).await.map(|_| ())
    }

    pub async fn tag(&self, source: &str, target: &str) -> Result<(), ShellError> {
        self.run(&["tag", source, target]).await.map(|_| ())
    }

    /// Log the engine into a registry, passing the token on stdin
    pub async fn login(&self, registry: &str, user: &str, token: &str) -> Result<(), ShellError> {
        info!("Login to registry {} as {}", registry, user);
        shell::run_with_input(
            &self.program,
            &["login", "-u", user, "--password-stdin", registry],
            Some(token.as_bytes()),
        )
        .await
        .map(|_| ())
    }

    /// Publish a local image under its remote name
    pub async fn push(&self, local: &LocalImage, remote: &RemoteImage) -> Result<(), ShellError> {
        let remote_ref = remote.to_string();
        info!("Push {} -> {}", local, remote_ref);

        self.tag(&local.to_string(), &remote_ref).await?;
        let pushed = self.run(&["push", &remote_ref]).await.map(|_| ());

        // The remote tag only existed to drive the push
        if let Err(e) = self.remove_image(&remote_ref).await {
            warn!("Failed to untag {}: {}", remote_ref, e);
        }
        pushed
    }

    /// Fetch a remote image and make it available under a local name
    pub async fn pull(&self, remote: &RemoteImage, local: &LocalImage) -> Result<(), ShellError> {
        let remote_ref = remote.to_string();
        info!("Pull {} -> {}", remote_ref, local);

        self.run(&["pull", &remote_ref]).await?;
        self.tag(&remote_ref, &local.to_string()).await?;

        if let Err(e) = self.remove_image(&remote_ref).await {
            warn!("Failed to untag {}: {}", remote_ref, e);
        }
        Ok(())
    }

    /// Remove an image reference, forcing removal of tagged layers
    pub async fn remove_image(&self, reference: &str) -> Result<(), ShellError> {
        info!("Remove image {}", reference);
        self.run(&["rmi", "-f", reference]).await.map(|_| ())
    }

    /// Whether the engine knows an image reference
    pub async fn image_exists(&self, reference: &str) -> Result<bool, ShellError> {
        match self.run(&["image", "inspect", reference]).await {
            Ok(_) => Ok(true),
            Err(ShellError::NonZeroExit { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Default for ContainerEngine {
    fn default() -> Self {
        Self::docker()
    }
}
