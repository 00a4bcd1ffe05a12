use std::sync::Arc;

use agent_core::tools::{required_argument, Tool, ToolArguments, ToolError};
use async_trait::async_trait;

use crate::workspace::{SearchMatch, Workspace};

pub const MAX_REPORTED_MATCHES: usize = 20;

/// Regex search across the workspace.
pub struct SearchCodeTool {
    workspace: Arc<dyn Workspace>,
}

impl SearchCodeTool {
    pub fn new(workspace: Arc<dyn Workspace>) -> Self {
        Self { workspace }
    }

    fn format_matches(matches: &[SearchMatch]) -> String {
        let lines: Vec<String> = matches
            .iter()
            .take(MAX_REPORTED_MATCHES)
            .map(|m| format!("{}:{}: {}", m.path, m.line_number, m.line))
            .collect();

        if matches.len() > MAX_REPORTED_MATCHES {
            format!(
                "Found {} matches. First {}:\n{}",
                matches.len(),
                MAX_REPORTED_MATCHES,
                lines.join("\n")
            )
        } else {
            lines.join("\n")
        }
    }
}

#[async_trait]
impl Tool for SearchCodeTool {
    fn name(&self) -> &str {
        "search_code"
    }

    fn description(&self) -> &str {
        "Search workspace files with a regular expression. Arguments: query (required)"
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        let query = required_argument(args, "query")?;
        let matches = self
            .workspace
            .search_code(query)
            .await
            .map_err(|error| ToolError::Execution(error.to_string()))?;
        Ok(Self::format_matches(&matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(count: usize) -> Vec<SearchMatch> {
        (1..=count)
            .map(|line_number| SearchMatch {
                path: "src/lib.rs".to_string(),
                line_number,
                line: "todo!()".to_string(),
            })
            .collect()
    }

    #[test]
    fn small_result_sets_are_listed_in_full() {
        assert_eq!(
            SearchCodeTool::format_matches(&matches(2)),
            "src/lib.rs:1: todo!()\nsrc/lib.rs:2: todo!()"
        );
        assert_eq!(SearchCodeTool::format_matches(&[]), "");
    }

    #[test]
    fn large_result_sets_are_truncated_with_header() {
        let output = SearchCodeTool::format_matches(&matches(25));

        assert!(output.starts_with("Found 25 matches. First 20:\n"));
        assert_eq!(output.lines().count(), 21);
        assert!(output.ends_with("src/lib.rs:20: todo!()"));
    }
}
