//! Local command execution
//!
//! Runs a program to completion, capturing stdout, stderr and the exit code.
//! A non-zero exit is an error carrying all three.

use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::ShellError;

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run a command and wait for it to finish
pub async fn run(program: &str, args: &[&str]) -> Result<CommandOutput, ShellError> {
    run_with_input(program, args, None).await
}

/// Run a command, optionally feeding `input` on its stdin
pub async fn run_with_input(
    program: &str,
    args: &[&str],
    input: Option<&[u8]>,
) -> Result<CommandOutput, ShellError> {
    let command_line = format!("{} {}", program, args.join(" "));
    debug!("Running: {}", command_line);

    let spawn_error = |source: std::io::Error| ShellError::Spawn {
        program: program.to_string(),
        source,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_error)?;

    if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
        stdin.write_all(input).await.map_err(spawn_error)?;
        // Closing stdin lets the child see EOF
        drop(stdin);
    }

    let output = child.wait_with_output().await.map_err(spawn_error)?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    if !stdout.trim().is_empty() {
        debug!("{} stdout: {}", program, stdout.trim());
    }
    if !stderr.trim().is_empty() {
        debug!("{} stderr: {}", program, stderr.trim());
    }

    if !output.status.success() {
        return Err(ShellError::NonZeroExit {
            command: command_line,
            exit_code,
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_code,
    })
}
