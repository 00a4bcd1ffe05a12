use std::path::{Path, PathBuf};

use agent_llm::LLMConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_TURNS: usize = 25;

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a software engineering agent working inside a single workspace directory.

To act on the workspace, write one or more tool calls inside a <tool_code> block:

<tool_code>
  <tool name="TOOL_NAME">
    <ARGUMENT_NAME>value</ARGUMENT_NAME>
  </tool>
</tool_code>

Available tools:
- run_command: <program> (required), <args> (optional, quoted like a shell command line)
- list_files: <dir_path> (optional, defaults to the workspace root)
- read_file: <file_path> (required)
- read_skeleton: <file_path> (required, a Rust source file; returns its declarations without function bodies)
- write_file: <file_path> (required), <content> (required, the whole new file)
- search_code: <query> (required, a regular expression)

Paths are relative to the workspace root. Argument values are taken verbatim.
Tool results come back as messages starting with "Tool Output [name]:" or "Tool Error [name]:".
When the task is complete, answer without a <tool_code> block."#;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for the agent loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLoopConfig {
    /// Model requests allowed per `start_turn` before the turn is failed.
    pub max_turns: usize,
    /// Prepended as the first message of every new session.
    pub system_prompt: String,
    pub llm: LLMConfig,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            llm: LLMConfig::default(),
        }
    }
}

impl AgentLoopConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "Loaded agent config from {} (max_turns: {}, model: {})",
            path.display(),
            config.max_turns,
            config.llm.model
        );
        Ok(config)
    }
}
