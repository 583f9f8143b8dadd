use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::TimerError;

pub type OperatorId = String;
pub type ConversationId = String;

/// Unique key of a live timer: one per (operator, conversation) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerKey {
    pub operator_id: OperatorId,
    pub conversation_id: ConversationId,
}

impl TimerKey {
    /// Validating constructor. Both identifiers must be non-empty after trimming.
    pub fn new(operator_id: &str, conversation_id: &str) -> Result<Self, TimerError> {
        let operator_id = operator_id.trim();
        let conversation_id = conversation_id.trim();
        if operator_id.is_empty() {
            return Err(TimerError::InvalidIdentifier("operator_id"));
        }
        if conversation_id.is_empty() {
            return Err(TimerError::InvalidIdentifier("conversation_id"));
        }
        Ok(Self {
            operator_id: operator_id.to_string(),
            conversation_id: conversation_id.to_string(),
        })
    }

    pub fn not_found(&self) -> TimerError {
        TimerError::NotFound {
            operator_id: self.operator_id.clone(),
            conversation_id: self.conversation_id.clone(),
        }
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.operator_id, self.conversation_id)
    }
}

/// Commands the collaborator layer can issue against a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerCommand {
    /// Conversation opened in the inbox UI.
    Start,
    /// Operator navigated away or the tab is closing.
    Pause,
    /// Operator came back to the conversation.
    Resume,
    Stop,
}
