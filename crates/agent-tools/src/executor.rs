use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use agent_core::tools::{Tool, ToolArguments, ToolDispatcher, ToolError, ToolRegistry};
use async_trait::async_trait;

use crate::command::{CommandRunner, ProcessCommandRunner};
use crate::tools::{
    ListFilesTool, ReadFileTool, ReadSkeletonTool, RunCommandTool, SearchCodeTool, WriteFileTool,
};
use crate::workspace::{LocalWorkspace, Workspace};

/// Built-in tool dispatcher that uses ToolRegistry for dynamic dispatch
pub struct BuiltinToolDispatcher {
    registry: ToolRegistry,
}

impl BuiltinToolDispatcher {
    /// Creates a dispatcher with all built-in tools bound to the given collaborators
    pub fn new(workspace: Arc<dyn Workspace>, runner: Arc<dyn CommandRunner>) -> Self {
        let registry = ToolRegistry::new();
        Self::register_builtin_tools(&registry, workspace, runner);
        Self { registry }
    }

    /// Creates a dispatcher rooted at a local directory, running commands there
    pub fn for_workspace(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(
            Arc::new(LocalWorkspace::new(root)),
            Arc::new(ProcessCommandRunner::new(root)),
        )
    }

    /// Creates a dispatcher from an existing registry
    pub fn with_registry(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Returns a reference to the internal registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    fn register_builtin_tools(
        registry: &ToolRegistry,
        workspace: Arc<dyn Workspace>,
        runner: Arc<dyn CommandRunner>,
    ) {
        // Names are fixed and distinct, registration cannot collide.
        let _ = registry.register(RunCommandTool::new(runner));
        let _ = registry.register(ListFilesTool::new(workspace.clone()));
        let _ = registry.register(ReadFileTool::new(workspace.clone()));
        let _ = registry.register(ReadSkeletonTool::new(workspace.clone()));
        let _ = registry.register(WriteFileTool::new(workspace.clone()));
        let _ = registry.register(SearchCodeTool::new(workspace));
    }

    /// Registers a custom tool to this dispatcher
    pub fn register_tool<T: Tool + 'static>(&self, tool: T) -> Result<(), ToolError> {
        self.registry
            .register(tool)
            .map_err(|e| ToolError::Execution(e.to_string()))
    }
}

#[async_trait]
impl ToolDispatcher for BuiltinToolDispatcher {
    async fn execute(&self, name: &str, args: &ToolArguments) -> Result<String, ToolError> {
        let tool_name = name.trim();
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| ToolError::Unknown(tool_name.to_string()))?;

        let started = Instant::now();
        let result = tool.execute(args).await;
        log::debug!(
            "Tool '{}' finished in {:?} (ok: {})",
            tool_name,
            started.elapsed(),
            result.is_ok()
        );
        result
    }

    fn tool_names(&self) -> Vec<String> {
        self.registry.list_tool_names()
    }
}

/// Builder for a dispatcher with a hand-picked tool set
pub struct BuiltinToolDispatcherBuilder {
    registry: ToolRegistry,
}

impl BuiltinToolDispatcherBuilder {
    /// Creates a new builder with no tools registered
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
        }
    }

    /// Registers all default built-in tools
    pub fn with_default_tools(
        self,
        workspace: Arc<dyn Workspace>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        BuiltinToolDispatcher::register_builtin_tools(&self.registry, workspace, runner);
        self
    }

    /// Registers a custom tool
    pub fn with_tool<T: Tool + 'static>(self, tool: T) -> Result<Self, ToolError> {
        self.registry
            .register(tool)
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        Ok(self)
    }

    pub fn build(self) -> BuiltinToolDispatcher {
        BuiltinToolDispatcher {
            registry: self.registry,
        }
    }
}

impl Default for BuiltinToolDispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{FakeWorkspace, RecordingRunner};

    fn make_dispatcher() -> BuiltinToolDispatcher {
        BuiltinToolDispatcher::new(
            Arc::new(FakeWorkspace::default()),
            Arc::new(RecordingRunner::succeeding("ok")),
        )
    }

    #[test]
    fn test_dispatcher_has_all_builtin_tools() {
        let dispatcher = make_dispatcher();

        assert_eq!(
            dispatcher.tool_names(),
            vec![
                "list_files",
                "read_file",
                "read_skeleton",
                "run_command",
                "search_code",
                "write_file"
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_by_name() {
        let dispatcher = make_dispatcher();

        let error = dispatcher
            .execute("delete_everything", &ToolArguments::new())
            .await
            .unwrap_err();

        assert_eq!(error, ToolError::Unknown("delete_everything".to_string()));
        assert_eq!(error.to_string(), "Unknown tool: delete_everything");
    }

    #[tokio::test]
    async fn test_missing_argument_is_reported() {
        let dispatcher = make_dispatcher();

        let error = dispatcher
            .execute("read_file", &ToolArguments::new())
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Missing required argument: file_path");
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_tool() {
        let workspace = Arc::new(FakeWorkspace::default());
        let dispatcher =
            BuiltinToolDispatcher::new(workspace.clone(), Arc::new(RecordingRunner::succeeding("")));

        let mut args = ToolArguments::new();
        args.insert("file_path".to_string(), "notes.txt".to_string());
        args.insert("content".to_string(), "remember".to_string());
        dispatcher.execute("write_file", &args).await.unwrap();

        args.shift_remove("content");
        let content = dispatcher.execute("read_file", &args).await.unwrap();
        assert_eq!(content, "remember");
    }

    #[test]
    fn test_builder_empty() {
        let dispatcher = BuiltinToolDispatcherBuilder::new().build();
        assert!(dispatcher.tool_names().is_empty());
        assert!(dispatcher.registry().is_empty());
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let workspace: Arc<dyn Workspace> = Arc::new(FakeWorkspace::default());
        let builder = BuiltinToolDispatcherBuilder::new()
            .with_tool(ReadFileTool::new(workspace.clone()))
            .unwrap();

        assert!(builder.with_tool(ReadFileTool::new(workspace)).is_err());
    }
}
