//! Context builder: history window plus the new user message.
//!
//! Pure and deterministic: identical inputs always produce identical
//! contexts.

use hospinav_core::message::{ConversationMessage, Speaker, Turn, TurnContext};

/// Number of prior messages a specialist sees by default.
pub const DEFAULT_CONTEXT_WINDOW: usize = 6;

/// Builds the [`TurnContext`] for one specialist call.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    /// Maximum number of prior messages kept
    window: usize,
}

impl ContextBuilder {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Build the context for `new_user_text` from `history`.
    ///
    /// `history` is the conversation as it was before the new message was
    /// appended. Output length is `min(window, conversational messages) + 1`
    /// and the last turn is always the new user message.
    pub fn build(&self, history: &[ConversationMessage], new_user_text: &str) -> TurnContext {
        let mut turns: Vec<Turn> = history.iter().filter_map(to_turn).collect();
        let skip = turns.len().saturating_sub(self.window);
        turns.drain(..skip);

        turns.push(Turn::user(new_user_text));
        TurnContext { turns }
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW)
    }
}

/// System errors never reach the model.
fn to_turn(message: &ConversationMessage) -> Option<Turn> {
    match message.speaker {
        Speaker::User => Some(Turn::user(&message.text)),
        Speaker::Agent => Some(Turn::agent(&message.text)),
        Speaker::SystemError => None,
    }
}
