// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider trait for completion API integrations.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{CompletionRequest, CompletionStream};

/// Boundary to an external completion provider.
///
/// Implementations open exactly one request per call and surface the
/// response as a stream of text fragments. Callers must not hold more
/// than one stream open per session; the session layer enforces this
/// structurally by driving one turn at a time.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-readable name of this provider instance.
    fn name(&self) -> &str;

    /// Opens a streaming completion request.
    ///
    /// Failures before the first fragment are returned here; failures
    /// mid-stream surface as `Err` items on the returned stream. No
    /// failure is retried.
    async fn stream(&self, request: CompletionRequest)
        -> Result<CompletionStream, ParleyError>;
}
