//! SSE response -> [`LLMStream`] adapter.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Response;

use crate::provider::{LLMError, LLMStream, Result};
use crate::types::LLMChunk;

fn to_stream_error(err: LLMError) -> LLMError {
    match err {
        LLMError::Stream(msg) => LLMError::Stream(msg),
        other => LLMError::Stream(other.to_string()),
    }
}

/// Convert an SSE HTTP [`Response`] into an [`LLMStream`].
///
/// `handler` receives each event's `data` payload and returns `Ok(Some(chunk))`
/// to emit, `Ok(None)` to skip, or an error (mapped to `LLMError::Stream`).
/// The stream ends after the first `LLMChunk::Done`.
pub fn llm_stream_from_sse<H>(response: Response, mut handler: H) -> LLMStream
where
    H: FnMut(&str) -> Result<Option<LLMChunk>> + Send + 'static,
{
    let mut finished = false;
    let stream = response
        .bytes_stream()
        .eventsource()
        .map(move |event| {
            let event = event.map_err(|e| LLMError::Stream(e.to_string()))?;
            handler(event.data.as_str()).map_err(to_stream_error)
        })
        .filter_map(|result| async move {
            match result {
                Ok(Some(chunk)) => Some(Ok(chunk)),
                Ok(None) => None,
                Err(err) => Some(Err(err)),
            }
        })
        .take_while(move |item| {
            let keep = !finished;
            if matches!(item, Ok(LLMChunk::Done)) {
                finished = true;
            }
            futures::future::ready(keep)
        });

    Box::pin(stream)
}
