//! Built-in tools for the agent runtime.
//!
//! Every tool implements `agent_core::tools::Tool` and is bound to a
//! [`Workspace`] or a [`CommandRunner`]. [`BuiltinToolDispatcher`] routes
//! parsed tool calls to them by name.

pub mod command;
mod executor;
pub mod skeleton;
pub mod tools;
pub mod workspace;

pub use command::{
    tokenize_args, CommandError, CommandOutput, CommandRunner, ProcessCommandRunner,
    DEFAULT_COMMAND_TIMEOUT_SECS,
};
pub use executor::{BuiltinToolDispatcher, BuiltinToolDispatcherBuilder};
pub use skeleton::{rust_skeleton, skeleton_for, SkeletonError};
pub use tools::{
    ListFilesTool, ReadFileTool, ReadSkeletonTool, RunCommandTool, SearchCodeTool, WriteFileTool,
};
pub use workspace::{
    FileContent, FileEntry, LocalWorkspace, SearchMatch, Workspace, WorkspaceError, IGNORED_DIRS,
};
