// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams for the Parley chat client.
//!
//! Uses `#[async_trait]` for dynamic dispatch compatibility.

pub mod provider;

pub use provider::CompletionProvider;
