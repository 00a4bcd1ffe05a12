use thiserror::Error;

use crate::agent::types::{SessionId, SessionStatus};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session {0} already has a turn in progress")]
    TurnInProgress(SessionId),

    #[error("Session {session_id} exceeded the limit of {limit} model turns")]
    TurnLimitExceeded { session_id: SessionId, limit: usize },

    #[error("Session {session_id} cannot move from {from} to {to}")]
    InvalidTransition {
        session_id: SessionId,
        from: SessionStatus,
        to: SessionStatus,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session id '{0}' cannot be used as a file name")]
    InvalidSessionId(SessionId),

    #[error("Unreadable history row at line {line} of session {session_id}: {source}")]
    CorruptRow {
        session_id: SessionId,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cancelled")]
    Cancelled,
}
