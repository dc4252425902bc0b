//! Post-command execution through the platform shell.

use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use trellis_config::PostCommand;
use trellis_core::{CommandRunner, CommandStatus};

use crate::error::{FsOpsError, FsOpsResult};

/// [`CommandRunner`] that executes post-commands through the platform shell.
///
/// Commands inherit the parent's stdio, so their output lands in the
/// operator's terminal. A configured timeout kills the child when it
/// expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    /// Create a command runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, cwd: &Path, command: &PostCommand) -> anyhow::Result<CommandStatus> {
        let mut child = shell_command(&command.command);
        child.current_dir(cwd).envs(&command.env).kill_on_drop(true);

        debug!(
            command = %command.command,
            cwd = %cwd.display(),
            "running post-command"
        );
        let status = wait_for_status(cwd, &mut child, command).await?;
        Ok(CommandStatus {
            success: status.success(),
            exit_code: status.code(),
        })
    }
}

async fn wait_for_status(
    cwd: &Path,
    child: &mut Command,
    command: &PostCommand,
) -> FsOpsResult<ExitStatus> {
    match command.timeout_secs {
        Some(seconds) => {
            match tokio::time::timeout(Duration::from_secs(seconds), child.status()).await {
                Ok(result) => result.map_err(|error| FsOpsError::io("command.run", cwd, error)),
                Err(_elapsed) => Err(FsOpsError::Timeout {
                    command: command.command.clone(),
                    seconds,
                }),
            }
        }
        None => child
            .status()
            .await
            .map_err(|error| FsOpsError::io("command.run", cwd, error)),
    }
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(command_line);
    command
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    command
}
