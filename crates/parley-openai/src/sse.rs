// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for OpenAI chat-completions streaming responses.
//!
//! Converts a reqwest response byte stream into typed [`StreamEvent`]
//! variants using the `eventsource-stream` crate. OpenAI sends data-only
//! events: each `data:` line carries one `chat.completion.chunk` JSON
//! object, and the stream is terminated by the literal `data: [DONE]`.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use parley_core::ParleyError;

use crate::types::{ApiErrorResponse, ChatCompletionChunk};

/// Sentinel payload terminating an OpenAI SSE stream.
const DONE_SENTINEL: &str = "[DONE]";

/// Typed events from the OpenAI streaming protocol.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// An incremental piece of generated text.
    Delta(String),
    /// The choice finished; carries the finish reason (e.g., "stop", "length").
    Finished { reason: Option<String> },
    /// The `[DONE]` sentinel: no further events will arrive.
    Done,
}

/// Parses a reqwest streaming response into a stream of typed [`StreamEvent`]s.
///
/// Chunks that carry neither content nor a finish reason (the role-only
/// opening chunk) are skipped. A mid-stream JSON `error` payload is
/// surfaced as a provider error; transport failures surface as
/// connection errors.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, ParleyError>> + Send>> {
    let byte_stream = response.bytes_stream();
    let event_stream = byte_stream.eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = event.data.trim();
                if data == DONE_SENTINEL {
                    return Some(Ok(StreamEvent::Done));
                }
                parse_chunk(data).transpose()
            }
            Err(e) => Some(Err(ParleyError::Connection {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}

/// Parses one `data:` payload into a [`StreamEvent`].
///
/// Returns `Ok(None)` for chunks that carry neither content nor a finish
/// reason (the role-only opening chunk, empty choice arrays).
fn parse_chunk(data: &str) -> Result<Option<StreamEvent>, ParleyError> {
    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => {
            let Some(choice) = chunk.choices.into_iter().next() else {
                return Ok(None);
            };
            if let Some(text) = choice.delta.content {
                Ok(Some(StreamEvent::Delta(text)))
            } else if choice.finish_reason.is_some() {
                Ok(Some(StreamEvent::Finished {
                    reason: choice.finish_reason,
                }))
            } else {
                Ok(None)
            }
        }
        Err(parse_err) => {
            // The provider can inject an error object mid-stream.
            if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(data) {
                Err(ParleyError::Provider {
                    message: format!(
                        "OpenAI API error ({}): {}",
                        api_err.error.type_.as_deref().unwrap_or("unknown"),
                        api_err.error.message
                    ),
                    source: None,
                })
            } else {
                Err(ParleyError::Internal(format!(
                    "failed to parse stream chunk: {parse_err}"
                )))
            }
        }
    }
}
