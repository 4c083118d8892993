// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley chat client.
//!
//! This crate provides the error taxonomy, domain types, and the
//! provider trait seam used throughout the Parley workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use traits::CompletionProvider;
pub use types::{
    ChatModel, CompletionEvent, CompletionRequest, CompletionStream, GenerationParams, Role,
    Turn,
};
