use std::sync::Arc;

use agent_core::tools::{optional_argument, required_argument, Tool, ToolArguments, ToolError};
use async_trait::async_trait;

use crate::command::{tokenize_args, CommandOutput, CommandRunner};

/// Runs a program with a quote-aware argument string.
pub struct RunCommandTool {
    runner: Arc<dyn CommandRunner>,
}

impl RunCommandTool {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// stdout then stderr, plus an exit-code note when the command failed.
    pub fn format_output(output: &CommandOutput) -> String {
        let mut text = format!("{}{}", output.stdout, output.stderr);
        if output.exit_code != 0 {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&format!("(Exit Code: {})", output.exit_code));
        }
        text
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Run a program in the workspace. Arguments: program (required), args (optional, quoted like a shell)"
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        let program = required_argument(args, "program")?.trim();
        if program.is_empty() {
            return Err(ToolError::MissingArgument("program".to_string()));
        }
        let argv = match optional_argument(args, "args") {
            Some(raw) => tokenize_args(raw).map_err(|error| ToolError::Execution(error.to_string()))?,
            None => Vec::new(),
        };

        log::debug!("Running '{}' with {} argument(s)", program, argv.len());
        let output = self
            .runner
            .run(program, &argv)
            .await
            .map_err(|error| ToolError::Execution(error.to_string()))?;

        Ok(Self::format_output(&output))
    }
}
