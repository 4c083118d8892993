// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley chat client.

use thiserror::Error;

/// The primary error type used across the Parley workspace.
///
/// Every failure of a chat turn maps to exactly one variant; all of them
/// are recovered at the REPL and rendered inline, never propagated past it.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, out-of-range parameters, unknown model).
    #[error("configuration error: {0}")]
    Config(String),

    /// No API key available from any source. Checked before the gateway
    /// is ever constructed, so no request is attempted without one.
    #[error(
        "OpenAI API key not found. Pass --api-key, set openai.api_key in parley.toml, \
         or export OPENAI_API_KEY"
    )]
    MissingCredential,

    /// The provider rejected the request with a quota or rate-limit error (HTTP 429).
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// Transport-level failure: connect, TLS, timeout, or a broken stream.
    #[error("connection error: {message}")]
    Connection {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider-side rejection other than rate limiting (bad credential,
    /// invalid request, server error).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_has_all_variants() {
        // Verify all 6 variants exist and can be constructed.
        let _config = ParleyError::Config("test".into());
        let _missing = ParleyError::MissingCredential;
        let _rate = ParleyError::RateLimited {
            message: "test".into(),
        };
        let _conn = ParleyError::Connection {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _provider = ParleyError::Provider {
            message: "test".into(),
            source: None,
        };
        let _internal = ParleyError::Internal("test".into());
    }

    #[test]
    fn missing_credential_names_all_sources() {
        let msg = ParleyError::MissingCredential.to_string();
        assert!(msg.contains("--api-key"), "got: {msg}");
        assert!(msg.contains("openai.api_key"), "got: {msg}");
        assert!(msg.contains("OPENAI_API_KEY"), "got: {msg}");
    }

    #[test]
    fn display_includes_message() {
        let err = ParleyError::RateLimited {
            message: "Rate limit exceeded".into(),
        };
        assert!(err.to_string().contains("Rate limit exceeded"));
    }
}
