use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tools::ToolCall;

/// Opaque, unique identifier of a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Origin of a message, fixed when the message is created.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    UserInput,
    ToolOutput,
    #[default]
    Plain,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, kind: MessageKind, content: String) -> Self {
        Self {
            role,
            kind,
            content,
            tool_calls: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, MessageKind::Plain, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, MessageKind::UserInput, content.into())
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut message = Self::new(Role::Assistant, MessageKind::Plain, content.into());
        message.tool_calls = tool_calls;
        message
    }

    /// Tool results travel with the user role; `kind` tells them apart from typed input.
    pub fn tool_output(content: impl Into<String>) -> Self {
        Self::new(Role::User, MessageKind::ToolOutput, content.into())
    }

    pub fn is_tool_output(&self) -> bool {
        self.kind == MessageKind::ToolOutput
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Waiting,
    Error,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Waiting => "waiting",
            SessionStatus::Error => "error",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Waiting, Running)
                | (Running, Waiting)
                | (Running, Error)
                | (Running, Cancelled)
                | (Error, Idle)
                | (Cancelled, Idle)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_follow_turn_lifecycle() {
        use SessionStatus::*;

        assert!(Idle.can_transition_to(Running));
        assert!(Waiting.can_transition_to(Running));
        assert!(Running.can_transition_to(Cancelled));
        assert!(Error.can_transition_to(Idle));

        assert!(!Idle.can_transition_to(Waiting));
        assert!(!Error.can_transition_to(Running));
        assert!(!Cancelled.can_transition_to(Running));
        assert!(!Running.can_transition_to(Running));
    }

    #[test]
    fn tool_output_uses_user_role_with_explicit_kind() {
        let message = Message::tool_output("Tool Output [read_file]:\nhello");

        assert_eq!(message.role, Role::User);
        assert!(message.is_tool_output());
        assert!(!Message::user("Tool Output [fake]:\n").is_tool_output());
    }

    #[test]
    fn message_serializes_kind_and_omits_empty_tool_calls() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["kind"], "user_input");
        assert!(json.get("tool_calls").is_none());
    }
}
