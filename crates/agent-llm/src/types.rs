use serde::{Deserialize, Serialize};

/// One increment of a streamed model turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LLMChunk {
    Token(String),
    Done,
}
