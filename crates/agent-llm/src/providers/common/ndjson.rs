//! Newline-delimited JSON -> [`LLMStream`] adapter.

use futures_util::StreamExt;
use reqwest::Response;

use super::sse::{into_stream_error, stop_after_done};
use crate::provider::{LLMError, LLMStream, Result};
use crate::types::LLMChunk;

/// Decode a response whose body is one JSON document per line.
///
/// Lines may be split across network chunks; a trailing line without a
/// newline is still delivered. Blank lines are skipped.
pub fn llm_stream_from_ndjson<H>(response: Response, mut handler: H) -> LLMStream
where
    H: FnMut(&str) -> Result<Option<LLMChunk>> + Send + 'static,
{
    let bytes = Box::pin(response.bytes_stream());

    let lines = futures_util::stream::unfold(
        (bytes, Vec::<u8>::new(), false),
        |(mut bytes, mut buffer, mut finished)| async move {
            loop {
                if let Some(newline) = buffer.iter().position(|byte| *byte == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline).collect();
                    return Some((Ok(line), (bytes, buffer, finished)));
                }

                if finished {
                    if buffer.is_empty() {
                        return None;
                    }
                    let line = std::mem::take(&mut buffer);
                    return Some((Ok(line), (bytes, buffer, finished)));
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(error)) => {
                        buffer.clear();
                        let error = LLMError::Stream(error.to_string());
                        return Some((Err(error), (bytes, buffer, true)));
                    }
                    None => finished = true,
                }
            }
        },
    );

    let stream = lines.filter_map(move |line| {
        let item = match line {
            Err(error) => Some(Err(error)),
            Ok(line) => {
                let text = String::from_utf8_lossy(&line);
                let text = text.trim();
                if text.is_empty() {
                    None
                } else {
                    handler(text).map_err(into_stream_error).transpose()
                }
            }
        };
        futures_util::future::ready(item)
    });

    Box::pin(stop_after_done(stream))
}
