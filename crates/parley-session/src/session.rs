// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session state machine that drives one chat turn at a time.
//!
//! Each turn goes through phases:
//! Idle -> AwaitingFirstFragment -> Streaming -> Committed | Failed.
//! Committed and Failed are terminal for the turn; either way control is
//! back with the caller and the session accepts the next submission.

use std::fmt;

use futures::StreamExt;
use parley_core::{
    CompletionEvent, CompletionProvider, CompletionRequest, GenerationParams, ParleyError,
    Turn,
};
use tracing::{debug, warn};

use crate::conversation::Conversation;

/// Default system instruction, used when the configuration provides none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, friendly, and knowledgeable \
     assistant. Provide clear, concise, and accurate responses.";

/// Phases of a single chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn has run yet (or the store was just cleared).
    Idle,
    /// Request opened, no fragment received yet.
    AwaitingFirstFragment,
    /// At least one fragment received.
    Streaming,
    /// The assistant turn was committed to the store.
    Committed,
    /// The turn failed; nothing was committed.
    Failed,
}

impl TurnPhase {
    /// True when no request is in flight and a new turn may start.
    pub fn is_settled(&self) -> bool {
        matches!(self, TurnPhase::Idle | TurnPhase::Committed | TurnPhase::Failed)
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "idle"),
            TurnPhase::AwaitingFirstFragment => write!(f, "awaiting_first_fragment"),
            TurnPhase::Streaming => write!(f, "streaming"),
            TurnPhase::Committed => write!(f, "committed"),
            TurnPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Owns one conversation and the fixed system instruction, and drives
/// turns against a completion provider.
///
/// The session is an explicitly passed, owned context object: create one
/// per chat session and thread it through. `run_turn` takes `&mut self`,
/// so a second request cannot be opened while one is outstanding.
pub struct ChatSession {
    conversation: Conversation,
    system_prompt: String,
    phase: TurnPhase,
}

impl ChatSession {
    /// Creates a session with an empty conversation.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::new(),
            system_prompt: system_prompt.into(),
            phase: TurnPhase::Idle,
        }
    }

    /// The stored conversation, in chronological order.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The fixed system instruction sent with every request.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Current phase of the most recent turn.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Clears the conversation and returns to the idle phase.
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.phase = TurnPhase::Idle;
    }

    /// Runs one complete chat turn.
    ///
    /// Appends `input` as a user turn, opens one streaming request with the
    /// system instruction prepended, feeds each fragment to `on_fragment`
    /// in arrival order, and on stream exhaustion commits the concatenated
    /// text as a single assistant turn.
    ///
    /// On any failure nothing is committed: the user turn already appended
    /// remains, and no partial assistant turn is stored. Failures are
    /// never retried here.
    ///
    /// Out-of-range parameters are rejected before the user turn is
    /// appended and before the provider is reached.
    pub async fn run_turn<F>(
        &mut self,
        provider: &dyn CompletionProvider,
        input: &str,
        params: &GenerationParams,
        on_fragment: F,
    ) -> Result<String, ParleyError>
    where
        F: FnMut(&str),
    {
        params.validate()?;

        self.conversation.append(Turn::user(input));
        self.phase = TurnPhase::AwaitingFirstFragment;

        match self.drive_stream(provider, params, on_fragment).await {
            Ok(reply) => {
                self.conversation.append(Turn::assistant(reply.clone()));
                self.phase = TurnPhase::Committed;
                debug!(
                    turns = self.conversation.len(),
                    reply_chars = reply.len(),
                    "assistant turn committed"
                );
                Ok(reply)
            }
            Err(e) => {
                self.phase = TurnPhase::Failed;
                warn!(error = %e, "turn failed, no assistant turn committed");
                Err(e)
            }
        }
    }

    /// Opens the streaming request and concatenates fragments in arrival
    /// order. Dropping the returned future abandons the in-flight stream.
    async fn drive_stream<F>(
        &mut self,
        provider: &dyn CompletionProvider,
        params: &GenerationParams,
        mut on_fragment: F,
    ) -> Result<String, ParleyError>
    where
        F: FnMut(&str),
    {
        let request = CompletionRequest {
            model: params.model,
            system_prompt: Some(self.system_prompt.clone()),
            turns: self.conversation.turns().to_vec(),
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
            stream: true,
        };

        let mut stream = provider.stream(request).await?;
        let mut reply = String::new();

        while let Some(event) = stream.next().await {
            match event? {
                CompletionEvent::Fragment(text) => {
                    self.phase = TurnPhase::Streaming;
                    reply.push_str(&text);
                    on_fragment(&text);
                }
                CompletionEvent::Finished { reason } => {
                    if let Some(reason) = reason {
                        debug!(reason = %reason, "generation finished");
                    }
                }
            }
        }

        Ok(reply)
    }
}

/// Resolves the system instruction following priority: file > inline > default.
pub fn resolve_system_prompt(
    inline_prompt: &Option<String>,
    prompt_file: &Option<String>,
) -> String {
    if let Some(file_path) = prompt_file {
        match std::fs::read_to_string(file_path) {
            Ok(content) => {
                let trimmed = content.trim().to_string();
                if !trimmed.is_empty() {
                    debug!(path = file_path, "loaded system prompt from file");
                    return trimmed;
                }
            }
            Err(e) => {
                warn!(
                    path = file_path,
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    if let Some(prompt) = inline_prompt
        && !prompt.is_empty()
    {
        return prompt.clone();
    }

    DEFAULT_SYSTEM_PROMPT.to_string()
}

#[cfg(test)]
mod tests {
    use parley_core::{ChatModel, Role};
    use parley_test_utils::MockProvider;

    use super::*;

    fn params() -> GenerationParams {
        GenerationParams::default()
    }

    #[tokio::test]
    async fn successful_turns_alternate_user_assistant() {
        let provider = MockProvider::with_replies(vec![
            "reply one".to_string(),
            "reply two".to_string(),
            "reply three".to_string(),
        ]);
        let mut session = ChatSession::new(DEFAULT_SYSTEM_PROMPT);

        let n = 3;
        for i in 0..n {
            session
                .run_turn(&provider, &format!("question {i}"), &params(), |_| {})
                .await
                .unwrap();
        }

        // N submissions -> exactly 2N turns, strictly alternating.
        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 2 * n);
        for (i, turn) in turns.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected, "turn {i}");
        }
        assert_eq!(turns[1].content, "reply one");
        assert_eq!(turns[5].content, "reply three");
        assert_eq!(session.phase(), TurnPhase::Committed);
    }

    #[tokio::test]
    async fn fragments_concatenate_in_arrival_order() {
        let provider = MockProvider::new();
        provider.push_fragments(vec!["Hel", "lo", "!"]).await;
        let mut session = ChatSession::new("system");

        let mut seen = Vec::new();
        let reply = session
            .run_turn(&provider, "greet me", &params(), |fragment| {
                seen.push(fragment.to_string());
            })
            .await
            .unwrap();

        assert_eq!(reply, "Hello!");
        assert_eq!(seen, vec!["Hel", "lo", "!"]);
        assert_eq!(session.conversation().last().unwrap().content, "Hello!");
        assert_eq!(session.conversation().last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn failure_at_open_commits_nothing_but_keeps_user_turn() {
        let provider = MockProvider::new();
        provider
            .push_failure(ParleyError::RateLimited {
                message: "scripted".into(),
            })
            .await;
        let mut session = ChatSession::new("system");

        let err = session
            .run_turn(&provider, "hello?", &params(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::RateLimited { .. }));

        // The user's own turn remains; only the reply is withheld.
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.conversation().last().unwrap().role, Role::User);
        assert_eq!(session.phase(), TurnPhase::Failed);
    }

    #[tokio::test]
    async fn mid_stream_failure_discards_partial_reply() {
        let provider = MockProvider::new();
        provider
            .push_failure_after(
                vec!["partial ", "text"],
                ParleyError::Connection {
                    message: "scripted".into(),
                    source: None,
                },
            )
            .await;
        let mut session = ChatSession::new("system");
        session.conversation.append(Turn::user("earlier"));
        session.conversation.append(Turn::assistant("earlier reply"));
        let size_before = session.conversation().len();

        let mut seen = Vec::new();
        let err = session
            .run_turn(&provider, "more?", &params(), |fragment| {
                seen.push(fragment.to_string());
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ParleyError::Connection { .. }));
        // Fragments were rendered before the failure, but none were committed.
        assert_eq!(seen, vec!["partial ", "text"]);
        assert_eq!(session.conversation().len(), size_before + 1);
        assert_eq!(session.conversation().last().unwrap().content, "more?");
    }

    #[tokio::test]
    async fn rate_limit_mid_stream_commits_nothing() {
        let provider = MockProvider::new();
        provider
            .push_failure_after(
                vec!["ra"],
                ParleyError::RateLimited {
                    message: "Rate limit reached".into(),
                },
            )
            .await;
        let mut session = ChatSession::new("system");
        let size_before = session.conversation().len();

        let err = session
            .run_turn(&provider, "hello", &params(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ParleyError::RateLimited { .. }));
        // Only the user's turn was added; the partial reply was discarded.
        assert_eq!(session.conversation().len(), size_before + 1);
        assert_eq!(session.conversation().last().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn out_of_range_params_never_reach_provider() {
        let provider = MockProvider::new();
        let mut session = ChatSession::new("system");

        let bad = GenerationParams {
            model: ChatModel::Gpt4,
            temperature: 3.0,
            max_output_tokens: 500,
        };
        let err = session
            .run_turn(&provider, "hello", &bad, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ParleyError::Config(_)));
        // Rejected before the store was touched and before the gateway was called.
        assert!(session.conversation().is_empty());
        assert_eq!(provider.call_count().await, 0);
        assert_eq!(session.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn system_turn_is_sent_but_never_stored() {
        let provider = MockProvider::with_replies(vec!["ok".to_string()]);
        let mut session = ChatSession::new("Always answer in French.");

        session
            .run_turn(&provider, "bonjour", &params(), |_| {})
            .await
            .unwrap();

        let request = provider.requests().await.into_iter().next().unwrap();
        assert_eq!(
            request.system_prompt.as_deref(),
            Some("Always answer in French.")
        );
        // The request carries only the stored turns; the system instruction
        // travels out of band and is synthesized per request.
        assert!(request.turns.iter().all(|t| t.role != Role::System));
        assert!(session
            .conversation()
            .turns()
            .iter()
            .all(|t| t.role != Role::System));
    }

    #[tokio::test]
    async fn request_carries_current_params() {
        let provider = MockProvider::with_replies(vec!["ok".to_string()]);
        let mut session = ChatSession::new("system");

        let custom = GenerationParams {
            model: ChatModel::Gpt35Turbo,
            temperature: 1.5,
            max_output_tokens: 4000,
        };
        session
            .run_turn(&provider, "hi", &custom, |_| {})
            .await
            .unwrap();

        let request = provider.requests().await.into_iter().next().unwrap();
        assert_eq!(request.model, ChatModel::Gpt35Turbo);
        assert_eq!(request.temperature, 1.5);
        assert_eq!(request.max_tokens, 4000);
        assert!(request.stream);
    }

    #[tokio::test]
    async fn clear_empties_store_and_returns_to_idle() {
        let provider = MockProvider::with_replies(vec!["ok".to_string()]);
        let mut session = ChatSession::new("system");
        session.run_turn(&provider, "hi", &params(), |_| {}).await.unwrap();
        assert_eq!(session.conversation().len(), 2);

        session.clear();
        assert!(session.conversation().is_empty());
        assert_eq!(session.phase(), TurnPhase::Idle);

        // Clearing an empty store is a no-op.
        session.clear();
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn empty_stream_commits_empty_assistant_turn() {
        let provider = MockProvider::new();
        provider.push_fragments(vec![]).await;
        let mut session = ChatSession::new("system");

        let reply = session
            .run_turn(&provider, "say nothing", &params(), |_| {})
            .await
            .unwrap();
        assert_eq!(reply, "");
        assert_eq!(session.conversation().len(), 2);
    }

    #[test]
    fn turn_phase_display() {
        assert_eq!(TurnPhase::Idle.to_string(), "idle");
        assert_eq!(
            TurnPhase::AwaitingFirstFragment.to_string(),
            "awaiting_first_fragment"
        );
        assert_eq!(TurnPhase::Streaming.to_string(), "streaming");
        assert_eq!(TurnPhase::Committed.to_string(), "committed");
        assert_eq!(TurnPhase::Failed.to_string(), "failed");
    }

    #[test]
    fn terminal_phases_are_settled() {
        assert!(TurnPhase::Idle.is_settled());
        assert!(TurnPhase::Committed.is_settled());
        assert!(TurnPhase::Failed.is_settled());
        assert!(!TurnPhase::AwaitingFirstFragment.is_settled());
        assert!(!TurnPhase::Streaming.is_settled());
    }

    #[test]
    fn system_prompt_default() {
        let prompt = resolve_system_prompt(&None, &None);
        assert_eq!(prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn system_prompt_inline_overrides_default() {
        let prompt = resolve_system_prompt(&Some("Custom prompt.".into()), &None);
        assert_eq!(prompt, "Custom prompt.");
    }

    #[test]
    fn system_prompt_file_overrides_inline() {
        let dir = std::env::temp_dir().join("parley-test-prompt");
        let _ = std::fs::create_dir_all(&dir);
        let file_path = dir.join("prompt.md");
        std::fs::write(&file_path, "File-based prompt.").unwrap();

        let prompt = resolve_system_prompt(
            &Some("Inline prompt.".into()),
            &Some(file_path.to_string_lossy().into_owned()),
        );
        assert_eq!(prompt, "File-based prompt.");

        let _ = std::fs::remove_file(&file_path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn system_prompt_missing_file_falls_back_to_inline() {
        let prompt = resolve_system_prompt(
            &Some("Fallback prompt.".into()),
            &Some("/nonexistent/path/prompt.md".into()),
        );
        assert_eq!(prompt, "Fallback prompt.");
    }
}
