pub mod jsonl;
pub mod memory;
pub mod session_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{Message, MessageKind, Role, SessionId, StoreError};
use crate::tools::ToolCall;

pub use jsonl::JsonlHistory;
pub use memory::MemoryHistory;
pub use session_store::{SessionStore, TurnLease};

/// One persisted message, keyed by session and position in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub session_id: SessionId,
    pub sequence: u64,
    pub role: Role,
    #[serde(default)]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl HistoryRow {
    pub fn from_message(session_id: &SessionId, sequence: u64, message: &Message) -> Self {
        Self {
            session_id: session_id.clone(),
            sequence,
            role: message.role,
            kind: message.kind,
            content: message.content.clone(),
            tool_calls: message.tool_calls.clone(),
            created_at: message.created_at,
        }
    }

    pub fn into_message(self) -> Message {
        Message {
            role: self.role,
            kind: self.kind,
            content: self.content,
            tool_calls: self.tool_calls,
            created_at: self.created_at,
        }
    }
}

/// Persistence collaborator for session logs.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append_row(&self, row: &HistoryRow) -> Result<(), StoreError>;

    /// Rows for `session_id` ordered by sequence; empty when the session is unknown.
    async fn load_rows(&self, session_id: &SessionId) -> Result<Vec<HistoryRow>, StoreError>;
}
