use agent_core::{render_tool_calls, Message, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{LLMConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::provider::{LLMError, LLMProvider, LLMStream, Result};
use crate::sse::llm_stream_from_sse;
use crate::types::LLMChunk;

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn from_config(config: &LLMConfig) -> Self {
        Self::new(config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_model(config.model.clone())
            .with_temperature(config.temperature)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request_body(&self, messages: &[Message]) -> serde_json::Value {
        let wire_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|message| {
                serde_json::json!({
                    "role": role_name(message.role),
                    "content": wire_content(message),
                })
            })
            .collect();

        log::debug!(
            "Request to model '{}' with {} message(s)",
            self.model,
            wire_messages.len()
        );

        serde_json::json!({
            "model": self.model,
            "messages": wire_messages,
            "temperature": self.temperature,
            "stream": true,
        })
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Assistant turns are replayed with their tool calls so the model sees what it asked for.
fn wire_content(message: &Message) -> String {
    if message.tool_calls.is_empty() {
        return message.content.clone();
    }
    let markup = render_tool_calls(&message.tool_calls);
    if message.content.is_empty() {
        markup
    } else {
        format!("{}\n{}", message.content, markup)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat_stream(&self, messages: &[Message]) -> Result<LLMStream> {
        let body = self.build_request_body(messages);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        Ok(llm_stream_from_sse(response, parse_sse_data))
    }
}

fn parse_sse_data(data: &str) -> Result<Option<LLMChunk>> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }
    if data == "[DONE]" {
        return Ok(Some(LLMChunk::Done));
    }

    let chunk: OpenAIStreamChunk = serde_json::from_str(data)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(LLMChunk::Token))
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    #[serde(default)]
    delta: OpenAIDelta,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAIDelta {
    content: Option<String>,
}
