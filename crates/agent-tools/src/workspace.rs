use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use walkdir::WalkDir;

/// Directory names never listed or searched.
pub const IGNORED_DIRS: [&str; 4] = [".git", "target", "node_modules", ".vscode"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub path: String,
    pub line_number: usize,
    pub line: String,
}

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Search task failed: {0}")]
    Search(String),
}

/// File-access collaborator; all paths are relative to the workspace root.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Entries of `dir_path` (the root when `None`), directories first.
    async fn list_files(&self, dir_path: Option<&str>) -> Result<Vec<FileEntry>, WorkspaceError>;
    async fn read_file(&self, path: &str) -> Result<FileContent, WorkspaceError>;
    async fn write_file(&self, path: &str, content: &str) -> Result<(), WorkspaceError>;
    async fn search_code(&self, query: &str) -> Result<Vec<SearchMatch>, WorkspaceError>;
}

/// Filesystem workspace confined to a root directory.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn canonical_root(&self) -> Result<PathBuf, WorkspaceError> {
        fs::canonicalize(&self.root)
            .await
            .map_err(|source| io_error(&self.root, source))
    }

    /// Maps a workspace-relative path to an absolute one that stays under the root.
    async fn resolve(&self, relative: &str) -> Result<PathBuf, WorkspaceError> {
        let relative_path = Path::new(relative);
        if relative_path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(WorkspaceError::SecurityViolation(format!(
                "path '{}' contains '..'",
                relative
            )));
        }

        let root = self.canonical_root().await?;
        let joined = root.join(relative_path);

        let mut existing = joined.as_path();
        while fs::symlink_metadata(existing).await.is_err() {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => break,
            }
        }
        let canonical = fs::canonicalize(existing)
            .await
            .map_err(|source| io_error(existing, source))?;
        if !canonical.starts_with(&root) {
            return Err(WorkspaceError::SecurityViolation(format!(
                "path '{}' is outside the workspace",
                relative
            )));
        }

        Ok(joined)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> WorkspaceError {
    WorkspaceError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn is_ignored(name: &str) -> bool {
    IGNORED_DIRS.contains(&name)
}

fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[async_trait]
impl Workspace for LocalWorkspace {
    async fn list_files(&self, dir_path: Option<&str>) -> Result<Vec<FileEntry>, WorkspaceError> {
        let root = self.canonical_root().await?;
        let target = match dir_path {
            Some(dir) => self.resolve(dir).await?,
            None => root.clone(),
        };

        let mut reader = fs::read_dir(&target)
            .await
            .map_err(|source| io_error(&target, source))?;
        let mut entries = Vec::new();

        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|source| io_error(&target, source))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_ignored(&name) {
                continue;
            }
            let is_dir = entry
                .file_type()
                .await
                .map_err(|source| io_error(&entry.path(), source))?
                .is_dir();
            entries.push(FileEntry {
                path: relative_display(&entry.path(), &root),
                name,
                is_dir,
            });
        }

        entries.sort_by(|left, right| {
            right
                .is_dir
                .cmp(&left.is_dir)
                .then_with(|| left.name.cmp(&right.name))
        });
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> Result<FileContent, WorkspaceError> {
        let full_path = self.resolve(path).await?;
        let content = fs::read_to_string(&full_path)
            .await
            .map_err(|source| io_error(Path::new(path), source))?;

        Ok(FileContent {
            path: path.to_string(),
            content,
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        let full_path = self.resolve(path).await?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }
        fs::write(&full_path, content)
            .await
            .map_err(|source| io_error(Path::new(path), source))
    }

    async fn search_code(&self, query: &str) -> Result<Vec<SearchMatch>, WorkspaceError> {
        let regex = Regex::new(query)?;
        let root = self.canonical_root().await?;

        tokio::task::spawn_blocking(move || search_tree(&root, &regex))
            .await
            .map_err(|error| WorkspaceError::Search(error.to_string()))
    }
}

fn search_tree(root: &Path, regex: &Regex) -> Vec<SearchMatch> {
    let mut matches = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !is_ignored(&entry.file_name().to_string_lossy())
        });

    for entry in walker.filter_map(|entry| entry.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        // Binary and unreadable files are skipped.
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        let path = relative_display(entry.path(), root);
        for (index, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                matches.push(SearchMatch {
                    path: path.clone(),
                    line_number: index + 1,
                    line: line.trim().to_string(),
                });
            }
        }
    }

    matches
}
