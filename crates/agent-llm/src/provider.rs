use std::pin::Pin;

use agent_core::tools::ToolCall;
use agent_core::{extract_tool_calls, Message};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::LLMChunk;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, LLMError>;

pub type LLMStream = Pin<Box<dyn Stream<Item = Result<LLMChunk>> + Send>>;

/// A whole assistant turn collected from a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub role: String,
    /// Visible text with tool-call markup removed.
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Stream chat completion for the full ordered history.
    async fn chat_stream(&self, messages: &[Message]) -> Result<LLMStream>;

    /// Non-streaming convenience: drains `chat_stream` and parses the markup.
    async fn send_chat(&self, messages: &[Message]) -> Result<ChatResponse> {
        let mut stream = self.chat_stream(messages).await?;
        let mut raw = String::new();

        while let Some(chunk) = stream.next().await {
            match chunk? {
                LLMChunk::Token(token) => raw.push_str(&token),
                LLMChunk::Done => break,
            }
        }

        let (content, tool_calls) = extract_tool_calls(&raw);
        Ok(ChatResponse {
            role: "assistant".to_string(),
            content,
            tool_calls,
        })
    }
}
