// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Parley workspace.

use std::pin::Pin;

use futures_core::Stream;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ParleyError;

/// Inclusive temperature bounds accepted by the gateway.
pub const TEMPERATURE_MIN: f32 = 0.0;
/// Inclusive temperature bounds accepted by the gateway.
pub const TEMPERATURE_MAX: f32 = 2.0;
/// Inclusive max-output-token bounds accepted by the gateway.
pub const MAX_TOKENS_MIN: u32 = 100;
/// Inclusive max-output-token bounds accepted by the gateway.
pub const MAX_TOKENS_MAX: u32 = 4000;

/// Speaker role of a single conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a conversation, tagged with its speaker role.
///
/// Immutable once created: the store only ever appends whole turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Creates a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Supported chat model identifiers.
///
/// The Display/FromStr spellings are the wire identifiers sent to the API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum ChatModel {
    #[strum(serialize = "gpt-4-turbo")]
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[strum(serialize = "gpt-4")]
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[strum(serialize = "gpt-3.5-turbo")]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl ChatModel {
    /// All supported model identifiers, in selector order.
    pub const ALL: [ChatModel; 3] = [
        ChatModel::Gpt4Turbo,
        ChatModel::Gpt4,
        ChatModel::Gpt35Turbo,
    ];
}

impl Default for ChatModel {
    fn default() -> Self {
        ChatModel::Gpt4Turbo
    }
}

/// Generation parameters for one gateway request.
///
/// Captured from the current UI state at submission time; not stored
/// with the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub model: ChatModel,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Validates parameter bounds. Boundary values are accepted.
    ///
    /// Called by the input layer before any gateway request is built, so
    /// out-of-range values never reach the provider.
    pub fn validate(&self) -> Result<(), ParleyError> {
        if !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&self.temperature) {
            return Err(ParleyError::Config(format!(
                "temperature must be between {TEMPERATURE_MIN} and {TEMPERATURE_MAX}, got {}",
                self.temperature
            )));
        }
        if !(MAX_TOKENS_MIN..=MAX_TOKENS_MAX).contains(&self.max_output_tokens) {
            return Err(ParleyError::Config(format!(
                "max output tokens must be between {MAX_TOKENS_MIN} and {MAX_TOKENS_MAX}, got {}",
                self.max_output_tokens
            )));
        }
        Ok(())
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: ChatModel::default(),
            temperature: 0.7,
            max_output_tokens: 500,
        }
    }
}

/// A request to a completion provider.
///
/// `turns` is the full conversation in chronological order; the provider
/// prepends `system_prompt` as the first wire message, so the synthesized
/// system turn never appears in the stored conversation.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: ChatModel,
    pub system_prompt: Option<String>,
    pub turns: Vec<Turn>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// One increment of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    /// A fragment of generated text, delivered in arrival order.
    Fragment(String),
    /// Generation finished; carries the provider's stop reason when known.
    Finished { reason: Option<String> },
}

/// A lazy, finite, non-restartable sequence of completion events.
///
/// Dropping the stream abandons the in-flight request.
pub type CompletionStream =
    Pin<Box<dyn Stream<Item = Result<CompletionEvent, ParleyError>> + Send>>;
