// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI chat-completions API.
//!
//! Provides [`OpenAiClient`] which handles request construction, bearer
//! authentication, and streaming SSE responses. Failures are terminal for
//! the current request: there is no retry.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use parley_core::ParleyError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::sse::{self, StreamEvent};
use crate::types::{ApiErrorResponse, ChatRequest};

/// Base URL for the OpenAI chat-completions API.
const API_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// HTTP client for OpenAI API communication.
///
/// Manages authentication headers and connection pooling. Every failure
/// maps to one variant of the error taxonomy and fails the current turn;
/// the caller decides whether to submit again.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a new OpenAI API client authenticated with `api_key`.
    pub fn new(api_key: &str) -> Result<Self, ParleyError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            ParleyError::Config(format!("invalid API key header value: {e}"))
        })?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ParleyError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends a streaming request and returns a stream of SSE events.
    ///
    /// The request is sent exactly once; quota, transport, and provider
    /// failures are mapped to the error taxonomy and returned immediately.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, ParleyError>> + Send>>, ParleyError>
    {
        let mut req = request.clone();
        req.stream = true;

        let response = self
            .client
            .post(&self.base_url)
            .json(&req)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        debug!(status = %status, model = %req.model, "streaming response received");

        if status.is_success() {
            return Ok(sse::parse_sse_stream(response));
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body))
    }
}

/// Maps a reqwest send error to the taxonomy: anything that failed before
/// an HTTP status was received counts as a connection failure.
fn classify_transport_error(e: reqwest::Error) -> ParleyError {
    ParleyError::Connection {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Maps a non-success HTTP status plus response body to the taxonomy.
///
/// 429 is quota/rate-limit rejection; everything else (bad credential,
/// invalid request, server error) is a provider-side rejection.
fn error_for_status(status: reqwest::StatusCode, body: &str) -> ParleyError {
    let detail = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!(
            "OpenAI API error ({}): {}",
            api_err.error.type_.as_deref().unwrap_or("unknown"),
            api_err.error.message
        ),
        Err(_) => format!("API returned {status}: {body}"),
    };

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        ParleyError::RateLimited { message: detail }
    } else {
        ParleyError::Provider {
            message: detail,
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new("sk-test-key")
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4-turbo".into(),
            messages: vec![crate::types::ChatMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            temperature: 0.7,
            max_tokens: 500,
            stream: false,
        }
    }

    fn sse_body() -> String {
        concat!(
            "data: {\"id\":\"chatcmpl-1\",\"model\":\"gpt-4-turbo\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"chatcmpl-1\",\"model\":\"gpt-4-turbo\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi!\"},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"chatcmpl-1\",\"model\":\"gpt-4-turbo\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n"
        )
        .to_string()
    }

    #[tokio::test]
    async fn stream_chat_success_yields_events_until_done() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body()),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client.stream_chat(&test_request()).await.unwrap();

        let mut saw_delta = false;
        let mut saw_done = false;
        while let Some(event) = stream.next().await {
            match event.unwrap() {
                StreamEvent::Delta(text) => {
                    assert_eq!(text, "Hi!");
                    saw_delta = true;
                }
                StreamEvent::Done => {
                    saw_done = true;
                    break;
                }
                StreamEvent::Finished { .. } => {}
            }
        }
        assert!(saw_delta && saw_done);
    }

    #[tokio::test]
    async fn stream_chat_forces_stream_flag() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({"stream": true}),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("data: [DONE]\n\n"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        // stream=false in the request; the client must flip it on.
        let result = client.stream_chat(&test_request()).await;
        assert!(result.is_ok(), "stream flag should be forced");
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited_without_retry() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {"message": "Rate limit reached", "type": "rate_limit_error"}
        });

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let Err(err) = client.stream_chat(&test_request()).await else {
            panic!("expected an error");
        };
        match err {
            ParleyError::RateLimited { message } => {
                assert!(message.contains("Rate limit reached"), "got: {message}");
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_credential_maps_to_provider_error() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        });

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(&error_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let Err(err) = client.stream_chat(&test_request()).await else {
            panic!("expected an error");
        };
        match err {
            ParleyError::Provider { message, .. } => {
                assert!(message.contains("Incorrect API key"), "got: {message}");
            }
            other => panic!("expected Provider, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_with_unparseable_body_includes_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let Err(err) = client.stream_chat(&test_request()).await else {
            panic!("expected an error");
        };
        match err {
            ParleyError::Provider { message, .. } => {
                assert!(message.contains("500"), "got: {message}");
                assert!(message.contains("boom"), "got: {message}");
            }
            other => panic!("expected Provider, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_sends_bearer_authorization_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("authorization", "Bearer sk-test-key"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("data: [DONE]\n\n"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.stream_chat(&test_request()).await;
        assert!(result.is_ok(), "headers should match");
    }
}
