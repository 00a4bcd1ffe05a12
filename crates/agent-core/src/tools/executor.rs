use async_trait::async_trait;
use thiserror::Error;

use crate::tools::ToolArguments;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    Unknown(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// Collaborator failure, message kept verbatim for the model to read.
    #[error("{0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, ToolError>;

/// Resolves a tool name plus ordered arguments to a handler and runs it.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    async fn execute(&self, name: &str, args: &ToolArguments) -> Result<String>;

    fn tool_names(&self) -> Vec<String> {
        Vec::new()
    }
}

pub fn required_argument<'a>(args: &'a ToolArguments, name: &str) -> Result<&'a str> {
    args.get(name)
        .map(String::as_str)
        .ok_or_else(|| ToolError::MissingArgument(name.to_string()))
}

/// Returns `None` for absent or empty arguments.
pub fn optional_argument<'a>(args: &'a ToolArguments, name: &str) -> Option<&'a str> {
    args.get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct StaticDispatcher {
        results: HashMap<String, String>,
    }

    #[async_trait]
    impl ToolDispatcher for StaticDispatcher {
        async fn execute(&self, name: &str, _args: &ToolArguments) -> Result<String> {
            self.results
                .get(name)
                .cloned()
                .ok_or_else(|| ToolError::Unknown(name.to_string()))
        }
    }

    #[tokio::test]
    async fn static_dispatcher_reports_unknown_tools() {
        let dispatcher = StaticDispatcher {
            results: HashMap::from([("echo".to_string(), "hi".to_string())]),
        };

        let args = ToolArguments::new();
        assert_eq!(dispatcher.execute("echo", &args).await.unwrap(), "hi");
        assert_eq!(
            dispatcher.execute("missing", &args).await,
            Err(ToolError::Unknown("missing".to_string()))
        );
        assert!(dispatcher.tool_names().is_empty());
    }

    #[test]
    fn required_argument_accepts_empty_values() {
        let mut args = ToolArguments::new();
        args.insert("content".to_string(), String::new());

        assert_eq!(required_argument(&args, "content"), Ok(""));
        assert_eq!(
            required_argument(&args, "file_path"),
            Err(ToolError::MissingArgument("file_path".to_string()))
        );
    }

    #[test]
    fn optional_argument_treats_empty_as_unset() {
        let mut args = ToolArguments::new();
        args.insert("dir_path".to_string(), String::new());

        assert_eq!(optional_argument(&args, "dir_path"), None);
        args.insert("dir_path".to_string(), "src".to_string());
        assert_eq!(optional_argument(&args, "dir_path"), Some("src"));
    }

    #[test]
    fn execution_error_displays_message_verbatim() {
        let error = ToolError::Execution("No such file or directory (os error 2)".to_string());
        assert_eq!(error.to_string(), "No such file or directory (os error 2)");
    }
}
