use std::sync::Arc;

use agent_core::tools::{required_argument, Tool, ToolArguments, ToolError};
use async_trait::async_trait;

use crate::workspace::Workspace;

pub const WRITE_CONFIRMATION: &str = "Successfully wrote file.";

/// Tool for writing file contents
pub struct WriteFileTool {
    workspace: Arc<dyn Workspace>,
}

impl WriteFileTool {
    pub fn new(workspace: Arc<dyn Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite a workspace file, creating parent directories. Arguments: file_path (required), content (required, may be empty)"
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        let path = required_argument(args, "file_path")?;
        let content = required_argument(args, "content")?;

        self.workspace
            .write_file(path, content)
            .await
            .map_err(|error| ToolError::Execution(error.to_string()))?;
        Ok(WRITE_CONFIRMATION.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::FakeWorkspace;

    #[tokio::test]
    async fn empty_content_is_allowed_but_key_is_required() {
        let workspace = Arc::new(FakeWorkspace::default());
        let tool = WriteFileTool::new(workspace.clone());

        let mut args = ToolArguments::new();
        args.insert("file_path".to_string(), "empty.txt".to_string());
        assert_eq!(
            tool.execute(&args).await,
            Err(ToolError::MissingArgument("content".to_string()))
        );

        args.insert("content".to_string(), String::new());
        assert_eq!(tool.execute(&args).await.unwrap(), WRITE_CONFIRMATION);
        assert_eq!(workspace.file("empty.txt"), Some(String::new()));
    }
}
