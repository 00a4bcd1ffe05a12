use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::agent::{SessionId, StoreError};
use crate::storage::{HistoryRepository, HistoryRow};

/// One `<session_id>.jsonl` file per session, one row per line.
#[derive(Debug, Clone)]
pub struct JsonlHistory {
    base_path: PathBuf,
}

impl JsonlHistory {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub async fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.base_path).await
    }

    /// Ids must be a single plain path component.
    fn rows_path(&self, session_id: &SessionId) -> Result<PathBuf, StoreError> {
        let id = session_id.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(StoreError::InvalidSessionId(session_id.clone()));
        }
        Ok(self.base_path.join(format!("{}.jsonl", id)))
    }
}

#[async_trait]
impl HistoryRepository for JsonlHistory {
    async fn append_row(&self, row: &HistoryRow) -> Result<(), StoreError> {
        let json = serde_json::to_string(row)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.rows_path(&row.session_id)?)
            .await?;
        file.write_all(json.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    async fn load_rows(&self, session_id: &SessionId) -> Result<Vec<HistoryRow>, StoreError> {
        let path = self.rows_path(session_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut rows = Vec::new();
        let mut line_number = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let row = serde_json::from_str::<HistoryRow>(&line).map_err(|source| {
                log::error!("[{}] Unreadable history row at line {}", session_id, line_number);
                StoreError::CorruptRow {
                    session_id: session_id.clone(),
                    line: line_number,
                    source,
                }
            })?;
            rows.push(row);
        }

        rows.sort_by_key(|row| row.sequence);
        Ok(rows)
    }
}
