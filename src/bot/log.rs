//! Conversation log for one channel.
//!
//! The first turn is the persona system prompt and is never removed.
//! Everything after it is appended in arrival order and kept for the life
//! of the process.

use crate::bot::error::EmptyLogError;
use crate::bot::turn::Turn;

pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(persona)],
        }
    }

    /// Add a turn. Turns with empty content are dropped.
    pub fn append(&mut self, turn: Turn) -> bool {
        if turn.content.is_empty() {
            return false;
        }
        self.turns.push(turn);
        true
    }

    /// Full ordered history, persona first.
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    /// Most recent turn after the persona.
    pub fn last(&self) -> Result<&Turn, EmptyLogError> {
        if self.turns.len() <= 1 {
            return Err(EmptyLogError);
        }
        self.turns.last().ok_or(EmptyLogError)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
