pub mod error;
pub mod events;
pub mod types;

pub use error::{AgentError, SessionError, StoreError};
pub use events::{SessionEvent, StreamEvent};
pub use types::{Message, MessageKind, Role, SessionId, SessionStatus};
