use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::workspace::{FileContent, FileEntry, SearchMatch, Workspace, WorkspaceError};

/// In-memory workspace whose root holds `src/` and `README.md`.
#[derive(Default)]
pub struct FakeWorkspace {
    files: Mutex<HashMap<String, String>>,
    listed: Mutex<Vec<Option<String>>>,
}

impl FakeWorkspace {
    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn listed_dirs(&self) -> Vec<Option<String>> {
        self.listed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Workspace for FakeWorkspace {
    async fn list_files(&self, dir_path: Option<&str>) -> Result<Vec<FileEntry>, WorkspaceError> {
        self.listed
            .lock()
            .unwrap()
            .push(dir_path.map(str::to_string));
        Ok(vec![
            FileEntry {
                path: "src".to_string(),
                name: "src".to_string(),
                is_dir: true,
            },
            FileEntry {
                path: "README.md".to_string(),
                name: "README.md".to_string(),
                is_dir: false,
            },
        ])
    }

    async fn read_file(&self, path: &str) -> Result<FileContent, WorkspaceError> {
        let content = self.file(path).ok_or_else(|| WorkspaceError::Io {
            path: path.to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        Ok(FileContent {
            path: path.to_string(),
            content,
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn search_code(&self, _query: &str) -> Result<Vec<SearchMatch>, WorkspaceError> {
        Ok(Vec::new())
    }
}

/// Records every invocation and answers with a canned result.
pub struct RecordingRunner {
    stdout: Option<String>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingRunner {
    pub fn succeeding(stdout: &str) -> Self {
        Self {
            stdout: Some(stdout.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            stdout: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        match &self.stdout {
            Some(stdout) => Ok(CommandOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
                exit_code: 0,
            }),
            None => Err(CommandError::Spawn {
                program: program.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}
