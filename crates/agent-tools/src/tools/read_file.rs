use std::sync::Arc;

use agent_core::tools::{required_argument, Tool, ToolArguments, ToolError};
use async_trait::async_trait;

use crate::workspace::Workspace;

/// Tool for reading file contents
pub struct ReadFileTool {
    workspace: Arc<dyn Workspace>,
}

impl ReadFileTool {
    pub fn new(workspace: Arc<dyn Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a text file of the workspace. Arguments: file_path (required)"
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        let path = required_argument(args, "file_path")?;
        let file = self
            .workspace
            .read_file(path)
            .await
            .map_err(|error| ToolError::Execution(error.to_string()))?;
        Ok(file.content)
    }
}
