use futures::StreamExt;

use agent_core::tools::{ToolCall, ToolCallAssembler};
use agent_core::{EventBus, Message, SessionId, StreamEvent, TagParser};
use agent_llm::{LLMChunk, LLMError, LLMStream};

/// Assistant turn under construction: visible text plus parsed tool calls.
#[derive(Debug, Default)]
pub struct PendingAssistant {
    parser: TagParser,
    content: String,
    tool_calls: ToolCallAssembler,
}

impl PendingAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, chunk: &str) -> Vec<StreamEvent> {
        let events = self.parser.feed(chunk);
        self.absorb(&events);
        events
    }

    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let events = self.parser.finish();
        self.absorb(&events);
        events
    }

    fn absorb(&mut self, events: &[StreamEvent]) {
        for event in events {
            if let StreamEvent::Token { content } = event {
                self.content.push_str(content);
            }
            self.tool_calls.update(event);
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.calls()
    }

    pub fn commit(self) -> Message {
        Message::assistant(self.content.trim(), self.tool_calls.finalize())
    }
}

/// Drains a model stream through the tag parser, publishing every parser event in order.
pub async fn consume_llm_stream(
    mut stream: LLMStream,
    bus: &EventBus,
    session_id: &SessionId,
) -> Result<PendingAssistant, LLMError> {
    let mut pending = PendingAssistant::new();
    let mut received_bytes = 0usize;

    while let Some(chunk_result) = stream.next().await {
        match chunk_result {
            Ok(LLMChunk::Token(token)) => {
                received_bytes += token.len();
                for event in pending.push_chunk(&token) {
                    bus.publish(session_id, event);
                }
            }
            Ok(LLMChunk::Done) => {
                log::debug!("[{}] LLM stream completed", session_id);
                break;
            }
            Err(error) => {
                log::warn!("[{}] LLM stream failed: {}", session_id, error);
                return Err(error);
            }
        }
    }

    for event in pending.finish() {
        if let StreamEvent::Error { message } = &event {
            log::warn!("[{}] Discarded malformed tool markup: {}", session_id, message);
        }
        bus.publish(session_id, event);
    }

    log::debug!(
        "[{}] Model turn parsed: {} bytes, {} tool call(s)",
        session_id,
        received_bytes,
        pending.tool_calls().len()
    );

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use agent_core::{Role, SessionEvent};
    use agent_llm::provider::Result as LLMResult;

    use super::*;

    fn build_stream(items: Vec<LLMResult<LLMChunk>>) -> LLMStream {
        Box::pin(stream::iter(items))
    }

    fn token(text: &str) -> LLMResult<LLMChunk> {
        Ok(LLMChunk::Token(text.to_string()))
    }

    #[tokio::test]
    async fn consume_llm_stream_publishes_parser_events_in_order() {
        let bus = EventBus::new();
        let session_id = SessionId::new();
        let mut subscription = bus.subscribe(&session_id);

        let stream = build_stream(vec![
            token("Let me look. <tool_co"),
            token("de><tool name=\"list_files\"><dir_path>src</dir_path>"),
            token("</tool></tool_code> Back soon."),
            Ok(LLMChunk::Done),
        ]);

        let pending = consume_llm_stream(stream, &bus, &session_id)
            .await
            .expect("stream should succeed");

        assert_eq!(pending.tool_calls().len(), 1);
        assert_eq!(pending.content(), "Let me look.  Back soon.");

        let events: Vec<StreamEvent> = subscription
            .drain()
            .into_iter()
            .map(|event| match event {
                SessionEvent::Stream { event } => event,
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(
            agent_core::coalesce_tokens(events),
            vec![
                StreamEvent::token("Let me look. "),
                StreamEvent::ToolStart {
                    name: "list_files".to_string()
                },
                StreamEvent::ToolArg {
                    name: "dir_path".to_string(),
                    value: "src".to_string()
                },
                StreamEvent::ToolEnd,
                StreamEvent::token(" Back soon."),
                StreamEvent::Done,
            ]
        );

        let message = pending.commit();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "Let me look.  Back soon.");
        assert_eq!(message.tool_calls[0].argument("dir_path"), Some("src"));
    }

    #[tokio::test]
    async fn consume_llm_stream_propagates_transport_errors() {
        let bus = EventBus::new();
        let stream = build_stream(vec![
            token("partial"),
            Err(LLMError::Stream("connection reset".to_string())),
        ]);

        let result = consume_llm_stream(stream, &bus, &SessionId::new()).await;

        assert!(matches!(result, Err(LLMError::Stream(_))));
    }

    #[tokio::test]
    async fn unterminated_block_is_reported_once() {
        let bus = EventBus::new();
        let session_id = SessionId::new();
        let mut subscription = bus.subscribe(&session_id);
        let stream = build_stream(vec![token("<tool_code><tool name=\"read_file\">")]);

        let pending = consume_llm_stream(stream, &bus, &session_id).await.unwrap();

        assert!(pending.tool_calls().is_empty());
        let errors = subscription
            .drain()
            .into_iter()
            .filter(|event| {
                matches!(
                    event,
                    SessionEvent::Stream {
                        event: StreamEvent::Error { .. }
                    }
                )
            })
            .count();
        assert_eq!(errors, 1);
    }
}
