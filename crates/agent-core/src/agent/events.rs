use serde::{Deserialize, Serialize};

use crate::agent::types::SessionStatus;

/// Output alphabet of the tag parser, forwarded to session observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Token {
        content: String,
    },

    ToolStart {
        name: String,
    },

    ToolArg {
        name: String,
        value: String,
    },

    ToolEnd,

    Error {
        message: String,
    },

    Done,
}

impl StreamEvent {
    pub fn token(content: impl Into<String>) -> Self {
        StreamEvent::Token {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Stream {
        event: StreamEvent,
    },

    Status {
        status: SessionStatus,
    },

    ToolOutput {
        tool_name: String,
        content: String,
        success: bool,
    },
}

impl From<StreamEvent> for SessionEvent {
    fn from(event: StreamEvent) -> Self {
        SessionEvent::Stream { event }
    }
}

impl From<SessionStatus> for SessionEvent {
    fn from(status: SessionStatus) -> Self {
        SessionEvent::Status { status }
    }
}
