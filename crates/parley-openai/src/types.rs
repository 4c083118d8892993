// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI chat-completions request/response types and SSE chunk types.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to the OpenAI chat-completions API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gpt-4-turbo").
    pub model: String,

    /// Conversation messages, system instruction first.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Whether to stream the response.
    pub stream: bool,
}

/// A single message in the OpenAI conversation format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,

    /// Text content of the message.
    pub content: String,
}

// --- SSE chunk types ---

/// One `chat.completion.chunk` object from the streaming response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    /// Chunk ID (shared across all chunks of one completion).
    pub id: String,
    /// Model that generated the chunk.
    pub model: String,
    /// Per-choice deltas; a single choice is requested, so index 0 only.
    pub choices: Vec<ChunkChoice>,
}

/// A single choice within a streaming chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    /// Choice index.
    pub index: usize,
    /// The incremental content delta.
    pub delta: ChunkDelta,
    /// Set on the final chunk of the choice (e.g., "stop", "length").
    pub finish_reason: Option<String>,
}

/// Incremental fields within a chunk choice.
///
/// The first chunk carries only `role`; subsequent chunks carry `content`;
/// the final chunk carries neither.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

// --- Error types ---

/// API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// Error detail within an API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable error message.
    pub message: String,
    /// Error type identifier (e.g., "invalid_request_error").
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    /// Machine-readable error code (e.g., "invalid_api_key").
    #[serde(default)]
    pub code: Option<String>,
}
