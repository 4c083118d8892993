// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides a mock completion provider for fast, deterministic,
//! CI-runnable tests without external API calls.

pub mod mock_provider;

pub use mock_provider::{MockProvider, Script};
