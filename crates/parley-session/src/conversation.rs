// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The append-only conversation store.

use parley_core::Turn;

/// An ordered, append-only sequence of turns for one chat session.
///
/// Insertion order is chronological order is display order. Turns are
/// never edited, reordered, or removed individually; the only destructive
/// operation is [`clear`](Conversation::clear). The synthesized system
/// turn sent with each gateway request is never stored here.
///
/// No role-sequencing validation is performed: consecutive turns with the
/// same role are legal. Growth is unbounded for the session's lifetime.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn to the end. O(1), cannot fail.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The full ordered sequence, for display and gateway submission.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Resets to the empty sequence. A no-op on an empty store.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Number of stored turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when no turns are stored.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recently appended turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
