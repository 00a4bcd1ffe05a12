use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to execute command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{program}' timed out after {seconds} seconds")]
    Timeout { program: String, seconds: u64 },

    #[error("Unbalanced quotes or trailing escape in args: {0}")]
    UnbalancedQuotes(String),
}

/// Command-execution collaborator: runs `program` with an argv list.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError>;
}

/// Spawns local processes inside the workspace directory.
pub struct ProcessCommandRunner {
    working_dir: PathBuf,
    timeout: Duration,
}

impl ProcessCommandRunner {
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&self.working_dir)
            .kill_on_drop(true);

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| CommandError::Timeout {
                program: program.to_string(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Splits an argument string with POSIX shell quoting rules.
///
/// Quotes are stripped and backslash escapes resolved; nothing is expanded.
pub fn tokenize_args(input: &str) -> Result<Vec<String>, CommandError> {
    shlex::split(input).ok_or_else(|| CommandError::UnbalancedQuotes(input.to_string()))
}
