use std::sync::Arc;

use agent_core::tools::{optional_argument, Tool, ToolArguments, ToolError};
use async_trait::async_trait;

use crate::workspace::Workspace;

/// Lists a workspace directory, one entry per line.
pub struct ListFilesTool {
    workspace: Arc<dyn Workspace>,
}

impl ListFilesTool {
    pub fn new(workspace: Arc<dyn Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List a directory of the workspace. Arguments: dir_path (optional, workspace root when empty)"
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        let entries = self
            .workspace
            .list_files(optional_argument(args, "dir_path"))
            .await
            .map_err(|error| ToolError::Execution(error.to_string()))?;

        Ok(entries
            .iter()
            .map(|entry| {
                if entry.is_dir {
                    format!("[DIR] {}", entry.name)
                } else {
                    entry.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
