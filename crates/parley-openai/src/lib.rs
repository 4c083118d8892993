// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI chat-completions provider for the Parley chat client.
//!
//! This crate implements [`CompletionProvider`] over the OpenAI
//! `/v1/chat/completions` endpoint in streaming mode.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use futures::stream::StreamExt;
use parley_config::ParleyConfig;
use parley_core::{
    CompletionEvent, CompletionProvider, CompletionRequest, CompletionStream, ParleyError,
};
use tracing::info;

use crate::client::OpenAiClient;
use crate::sse::StreamEvent;
use crate::types::{ChatMessage, ChatRequest};

/// OpenAI provider implementing [`CompletionProvider`].
///
/// One streaming request per call; no retry, no second request while a
/// returned stream is still being consumed (the session layer drives one
/// turn at a time).
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Creates a provider authenticated with an already-resolved API key.
    pub fn new(api_key: &str) -> Result<Self, ParleyError> {
        let client = OpenAiClient::new(api_key)?;
        Ok(Self { client })
    }

    /// Creates a provider from configuration plus an optional explicit key.
    ///
    /// # API Key Resolution
    /// 1. `explicit_key` (the `--api-key` flag) if set
    /// 2. `config.openai.api_key` (file or `PARLEY_OPENAI_API_KEY` env)
    /// 3. `OPENAI_API_KEY` environment variable
    /// 4. [`ParleyError::MissingCredential`] if none is available
    pub fn from_config(
        config: &ParleyConfig,
        explicit_key: Option<&str>,
    ) -> Result<Self, ParleyError> {
        let api_key = resolve_api_key(explicit_key, &config.openai.api_key)?;
        let provider = Self::new(&api_key)?;
        info!(
            model = config.openai.default_model,
            "OpenAI provider initialized"
        );
        Ok(provider)
    }

    /// Creates a provider with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: OpenAiClient) -> Self {
        Self { client }
    }

    /// Converts a [`CompletionRequest`] to the OpenAI wire format.
    ///
    /// The system instruction, when present, becomes the first wire
    /// message; stored conversation turns follow in order.
    fn to_chat_request(request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.turns.len() + 1);
        if let Some(ref system) = request.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.turns.iter().map(|turn| ChatMessage {
            role: turn.role.to_string(),
            content: turn.content.clone(),
        }));

        ChatRequest {
            model: request.model.to_string(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: request.stream,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionStream, ParleyError> {
        let chat_request = Self::to_chat_request(&request);
        let event_stream = self.client.stream_chat(&chat_request).await?;

        let completion_stream = event_stream.filter_map(|result| async move {
            match result {
                Ok(StreamEvent::Delta(text)) => Some(Ok(CompletionEvent::Fragment(text))),
                Ok(StreamEvent::Finished { reason }) => {
                    Some(Ok(CompletionEvent::Finished { reason }))
                }
                // The sentinel carries no content; the stream ends with it.
                Ok(StreamEvent::Done) => None,
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(completion_stream))
    }
}

/// Resolves the API key with user-entered values taking priority over
/// configuration, and configuration over the ambient environment.
pub fn resolve_api_key(
    explicit_key: Option<&str>,
    config_key: &Option<String>,
) -> Result<String, ParleyError> {
    if let Some(key) = explicit_key
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }

    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(ParleyError::MissingCredential),
    }
}
