//! Error types for the meadow-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! [`AgentError`] covers registry and messaging failures; [`ActionError`]
//! covers decisions the state machine refuses to apply.

use meadow_types::AgentId;

/// Errors that can occur during agent registry and messaging operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Agent with the given ID was not found in the registry.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// Agent ID already exists in the roster.
    #[error("duplicate agent id: {0}")]
    DuplicateId(AgentId),

    /// Agent name already exists in the roster.
    #[error("duplicate agent name: {0}")]
    DuplicateName(String),

    /// No agent carries the given display name.
    #[error("unknown recipient: {name}")]
    UnknownRecipient {
        /// The name the sender addressed.
        name: String,
    },

    /// An agent tried to text itself.
    #[error("agent {0} cannot message itself")]
    SelfAddressed(AgentId),
}

/// Errors raised while turning a decision into an action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The decision lacks a field its action requires.
    #[error("malformed decision: {reason}")]
    MalformedDecision {
        /// What was missing or invalid.
        reason: String,
    },

    /// The agent the decision targets does not exist.
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl ActionError {
    /// Shorthand for a [`ActionError::MalformedDecision`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDecision {
            reason: reason.into(),
        }
    }
}
