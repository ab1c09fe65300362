//! Decisions returned by the decision oracle.
//!
//! Wire shape (JSON):
//!
//! ```json
//! {"action": "move", "target": {"x": 1.5, "z": -2.0}}
//! {"action": "text", "target": {"agent": "Bob"}, "utterance": "hi"}
//! {"action": "idle"}
//! ```
//!
//! The decision is validated only when the action state machine applies
//! it; a structurally valid but incomplete decision (e.g. `move` without a
//! target) is a malformed decision, not a parse error.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::DecisionAction;

/// What a decision is aimed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum DecisionTarget {
    /// Another agent, addressed by display name.
    Agent {
        /// Display name of the agent.
        agent: String,
    },
    /// A point on the movement plane.
    Point {
        /// Target x coordinate.
        x: f64,
        /// Target z coordinate.
        z: f64,
    },
}

/// The oracle's answer for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Decision {
    /// The chosen action.
    pub action: DecisionAction,
    /// Point or agent the action is aimed at.
    #[serde(default)]
    pub target: Option<DecisionTarget>,
    /// Text to say or send.
    #[serde(default)]
    pub utterance: Option<String>,
}

impl Decision {
    /// Move to a point.
    pub const fn move_to(x: f64, z: f64) -> Self {
        Self {
            action: DecisionAction::Move,
            target: Some(DecisionTarget::Point { x, z }),
            utterance: None,
        }
    }

    /// Walk toward another agent.
    pub fn approach(agent: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::Move,
            target: Some(DecisionTarget::Agent {
                agent: agent.into(),
            }),
            utterance: None,
        }
    }

    /// Send `utterance` to the agent named `agent`.
    pub fn text(agent: impl Into<String>, utterance: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::Text,
            target: Some(DecisionTarget::Agent {
                agent: agent.into(),
            }),
            utterance: Some(utterance.into()),
        }
    }

    /// Rest for the configured duration.
    pub const fn idle() -> Self {
        Self {
            action: DecisionAction::Idle,
            target: None,
            utterance: None,
        }
    }

    /// Take a fresh look around.
    pub const fn observe() -> Self {
        Self {
            action: DecisionAction::Observe,
            target: None,
            utterance: None,
        }
    }

    /// Short human-readable description for logs.
    pub fn summary(&self) -> String {
        match (&self.action, &self.target) {
            (DecisionAction::Move, Some(DecisionTarget::Point { x, z })) => {
                format!("move to ({x:.1}, {z:.1})")
            }
            (DecisionAction::Move, Some(DecisionTarget::Agent { agent })) => {
                format!("move toward {agent}")
            }
            (DecisionAction::Text, Some(DecisionTarget::Agent { agent })) => format!(
                "text {agent}: {}",
                self.utterance.as_deref().unwrap_or_default()
            ),
            (DecisionAction::Idle, _) => String::from("rest"),
            (DecisionAction::Observe, _) => String::from("observe"),
            (action, _) => format!("{action:?} (incomplete)"),
        }
    }
}
