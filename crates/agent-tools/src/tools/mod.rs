pub mod list_files;
pub mod read_file;
pub mod read_skeleton;
pub mod run_command;
pub mod search_code;
pub mod write_file;

#[cfg(test)]
pub(crate) mod test_support;

pub use list_files::ListFilesTool;
pub use read_file::ReadFileTool;
pub use read_skeleton::ReadSkeletonTool;
pub use run_command::RunCommandTool;
pub use search_code::{SearchCodeTool, MAX_REPORTED_MATCHES};
pub use write_file::{WriteFileTool, WRITE_CONFIRMATION};
