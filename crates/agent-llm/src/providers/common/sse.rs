//! Server-sent events -> [`LLMStream`] adapter.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Response;

use crate::provider::{LLMError, LLMStream, Result};
use crate::types::LLMChunk;

/// Decode an SSE response body into an [`LLMStream`].
///
/// Events with blank `data:` payloads are skipped before reaching `handler`.
/// The handler returns the chunks one event carries, possibly none; its
/// errors surface as [`LLMError::Stream`]. The stream ends after the first
/// [`LLMChunk::Done`].
pub fn llm_stream_from_sse<H>(response: Response, mut handler: H) -> LLMStream
where
    H: FnMut(&str) -> Result<Vec<LLMChunk>> + Send + 'static,
{
    let stream = response
        .bytes_stream()
        .eventsource()
        .flat_map(move |event| {
            let items: Vec<Result<LLMChunk>> = match event {
                Err(error) => vec![Err(LLMError::Stream(error.to_string()))],
                Ok(event) if event.data.trim().is_empty() => Vec::new(),
                Ok(event) => match handler(&event.data) {
                    Ok(chunks) => chunks.into_iter().map(Ok).collect(),
                    Err(error) => vec![Err(into_stream_error(error))],
                },
            };
            futures_util::stream::iter(items)
        });

    Box::pin(stop_after_done(stream))
}

pub(crate) fn into_stream_error(error: LLMError) -> LLMError {
    match error {
        LLMError::Stream(message) => LLMError::Stream(message),
        other => LLMError::Stream(other.to_string()),
    }
}

/// Ends the stream right after the first `Done` (or error) so trailing bytes
/// after a completion marker are never decoded.
pub(crate) fn stop_after_done<S>(stream: S) -> impl futures::Stream<Item = Result<LLMChunk>> + Send
where
    S: futures::Stream<Item = Result<LLMChunk>> + Send,
{
    stream
        .scan(false, |finished, item| {
            if *finished {
                return futures_util::future::ready(None);
            }
            *finished = matches!(item, Ok(LLMChunk::Done) | Err(_));
            futures_util::future::ready(Some(item))
        })
}
