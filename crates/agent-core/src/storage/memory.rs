use async_trait::async_trait;
use dashmap::DashMap;

use crate::agent::{SessionId, StoreError};
use crate::storage::{HistoryRepository, HistoryRow};

#[derive(Debug, Default)]
pub struct MemoryHistory {
    rows: DashMap<SessionId, Vec<HistoryRow>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRepository for MemoryHistory {
    async fn append_row(&self, row: &HistoryRow) -> Result<(), StoreError> {
        self.rows
            .entry(row.session_id.clone())
            .or_default()
            .push(row.clone());
        Ok(())
    }

    async fn load_rows(&self, session_id: &SessionId) -> Result<Vec<HistoryRow>, StoreError> {
        let mut rows = self
            .rows
            .get(session_id)
            .map(|rows| rows.clone())
            .unwrap_or_default();
        rows.sort_by_key(|row| row.sequence);
        Ok(rows)
    }
}
