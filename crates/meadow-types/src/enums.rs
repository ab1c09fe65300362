//! Enumeration types for the Meadow simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Agent action states
// ---------------------------------------------------------------------------

/// The action an agent is currently executing, without payload.
///
/// `Idle` is both the initial state and the state an agent sits in while
/// waiting for its next decision. `Resting` is the idle-by-choice action
/// the oracle picks explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Waiting for a decision.
    Idle,
    /// Walking toward a goal target.
    Moving,
    /// Displaying an utterance (speech or text message).
    Speaking,
    /// Resting for a fixed duration.
    Resting,
}

impl ActionKind {
    /// Lowercase name used in logs and oracle prompts.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::Speaking => "speaking",
            Self::Resting => "resting",
        }
    }
}

/// An action that finished, reported by `action_completion` triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CompletedAction {
    /// The agent arrived at its move target.
    Move,
    /// The agent's utterance display window elapsed.
    Text,
    /// The agent's rest period elapsed.
    Idle,
    /// The agent picked up a coin.
    CollectCoin,
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// The action chosen by the decision oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DecisionAction {
    /// Walk to a point or toward another agent.
    Move,
    /// Send a text message to another agent (and display it).
    #[serde(alias = "say")]
    Text,
    /// Rest for the configured rest duration.
    Idle,
    /// Take a fresh look around without moving.
    Observe,
}

// ---------------------------------------------------------------------------
// World objects
// ---------------------------------------------------------------------------

/// Category of a world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ObjectKind {
    /// A static named place. Never changes.
    Landmark,
    /// A coin that can be picked up exactly once.
    Collectible,
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// Display color of an agent. Only the render layer interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AgentColor {
    /// Red.
    Red,
    /// Blue.
    Blue,
    /// Green.
    Green,
    /// Yellow.
    Yellow,
    /// Purple.
    Purple,
    /// Orange.
    Orange,
    /// Gray.
    Gray,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn say_is_accepted_as_text() {
        let parsed: Result<DecisionAction, _> = serde_json::from_str("\"say\"");
        assert_eq!(parsed.ok(), Some(DecisionAction::Text));
        let parsed: Result<DecisionAction, _> = serde_json::from_str("\"text\"");
        assert_eq!(parsed.ok(), Some(DecisionAction::Text));
    }

    #[test]
    fn unknown_color_is_rejected() {
        let parsed: Result<AgentColor, _> = serde_json::from_str("\"magenta\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn completed_action_uses_snake_case() {
        let json = serde_json::to_string(&CompletedAction::CollectCoin).ok();
        assert_eq!(json.as_deref(), Some("\"collect_coin\""));
    }
}
