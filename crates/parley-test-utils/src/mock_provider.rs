// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `CompletionProvider` with a FIFO script of
//! replies and failures, enabling fast, CI-runnable tests without
//! external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use parley_core::{
    CompletionEvent, CompletionProvider, CompletionRequest, CompletionStream, ParleyError,
};

/// One scripted provider interaction.
#[derive(Debug)]
pub enum Script {
    /// Stream the fragments in order, then finish with reason "stop".
    Reply { fragments: Vec<String> },
    /// Fail when the request is opened, before any fragment.
    FailOpen(ParleyError),
    /// Stream the leading fragments, then fail mid-stream.
    FailAfter {
        fragments: Vec<String>,
        error: ParleyError,
    },
}

/// A mock completion provider driven by a FIFO script.
///
/// Scripts are popped per `stream` call. When the script queue is empty,
/// a default single-fragment "mock reply" is streamed. Every request is
/// recorded for later inspection.
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Script>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with one single-fragment reply per text.
    pub fn with_replies(replies: Vec<String>) -> Self {
        let provider = Self::new();
        {
            let script = provider.script.clone();
            let mut queue = script.try_lock().expect("new provider is uncontended");
            for text in replies {
                queue.push_back(Script::Reply {
                    fragments: vec![text],
                });
            }
        }
        provider
    }

    /// Append a multi-fragment reply to the script.
    pub async fn push_fragments(&self, fragments: Vec<&str>) {
        self.script.lock().await.push_back(Script::Reply {
            fragments: fragments.into_iter().map(String::from).collect(),
        });
    }

    /// Append a failure that occurs when the request is opened.
    pub async fn push_failure(&self, error: ParleyError) {
        self.script.lock().await.push_back(Script::FailOpen(error));
    }

    /// Append a failure that occurs mid-stream, after the given fragments.
    pub async fn push_failure_after(&self, fragments: Vec<&str>, error: ParleyError) {
        self.script.lock().await.push_back(Script::FailAfter {
            fragments: fragments.into_iter().map(String::from).collect(),
            error,
        });
    }

    /// All requests seen so far, in call order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of `stream` calls made against this provider.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Pop the next script entry, or fall back to the default reply.
    async fn next_script(&self) -> Script {
        self.script.lock().await.pop_front().unwrap_or(Script::Reply {
            fragments: vec!["mock reply".to_string()],
        })
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionStream, ParleyError> {
        self.requests.lock().await.push(request);

        match self.next_script().await {
            Script::Reply { fragments } => {
                let mut items: Vec<Result<CompletionEvent, ParleyError>> = fragments
                    .into_iter()
                    .map(|f| Ok(CompletionEvent::Fragment(f)))
                    .collect();
                items.push(Ok(CompletionEvent::Finished {
                    reason: Some("stop".to_string()),
                }));
                Ok(Box::pin(stream::iter(items)))
            }
            Script::FailOpen(error) => Err(error),
            Script::FailAfter { fragments, error } => {
                let mut items: Vec<Result<CompletionEvent, ParleyError>> = fragments
                    .into_iter()
                    .map(|f| Ok(CompletionEvent::Fragment(f)))
                    .collect();
                items.push(Err(error));
                Ok(Box::pin(stream::iter(items)))
            }
        }
    }
}
