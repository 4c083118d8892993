// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store and per-turn state machine for the Parley chat client.

pub mod conversation;
pub mod session;

pub use conversation::Conversation;
pub use session::{resolve_system_prompt, ChatSession, TurnPhase, DEFAULT_SYSTEM_PROMPT};
