pub mod agent;
pub mod bus;
pub mod parser;
pub mod storage;
pub mod tools;

pub use agent::events::{SessionEvent, StreamEvent};
pub use agent::types::{Message, MessageKind, Role, SessionId, SessionStatus};
pub use agent::{AgentError, SessionError, StoreError};
pub use bus::{EventBus, Subscription};
pub use parser::{coalesce_tokens, extract_tool_calls, render_tool_calls, ParseError, TagParser};
pub use storage::{HistoryRepository, HistoryRow, JsonlHistory, MemoryHistory, SessionStore, TurnLease};
pub use tools::{ToolArguments, ToolCall, ToolCallAssembler, ToolDispatcher, ToolError};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
