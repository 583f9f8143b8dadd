use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// No active timer in the expected state for this key. Callers treat it as a no-op.
    #[error("no active timer for operator {operator_id} on conversation {conversation_id}")]
    NotFound {
        operator_id: String,
        conversation_id: String,
    },

    /// Empty or whitespace-only identifier. Rejected before reaching the controller.
    #[error("invalid identifier: {0} must not be empty")]
    InvalidIdentifier(&'static str),

    /// The owning reactor task has shut down.
    #[error("timer reactor is not running")]
    ReactorUnavailable,
}
