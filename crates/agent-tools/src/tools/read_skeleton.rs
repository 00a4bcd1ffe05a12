use std::sync::Arc;

use agent_core::tools::{required_argument, Tool, ToolArguments, ToolError};
use async_trait::async_trait;

use crate::skeleton::skeleton_for;
use crate::workspace::Workspace;

/// Outline of a source file: declarations kept, function bodies emptied.
pub struct ReadSkeletonTool {
    workspace: Arc<dyn Workspace>,
}

impl ReadSkeletonTool {
    pub fn new(workspace: Arc<dyn Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ReadSkeletonTool {
    fn name(&self) -> &str {
        "read_skeleton"
    }

    fn description(&self) -> &str {
        "Read the structure of a Rust source file without function bodies. Arguments: file_path (required)"
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        let path = required_argument(args, "file_path")?;
        let file = self
            .workspace
            .read_file(path)
            .await
            .map_err(|error| ToolError::Execution(format!("Error reading file: {}", error)))?;

        skeleton_for(path, &file.content).map_err(|error| {
            ToolError::Execution(format!("Error generating skeleton: {}", error))
        })
    }
}
