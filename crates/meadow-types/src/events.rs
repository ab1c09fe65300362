//! Events the simulation core emits toward the render layer and telemetry.
//!
//! The core does not know how these are drawn. Each state mutation that is
//! visible to an outside observer produces exactly one event.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, CompletedAction};
use crate::ids::{AgentId, ObjectId};
use crate::structs::{Position, WorldObject};

/// A visible change in the simulated world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WorldEvent {
    /// An agent's position, action, or utterance changed.
    AgentUpdated {
        /// The agent that changed.
        agent_id: AgentId,
        /// Current position.
        position: Position,
        /// Current action.
        action: ActionKind,
        /// Current utterance, if displayed.
        utterance: Option<String>,
    },
    /// A collectible was picked up and should disappear.
    ObjectCollected {
        /// The collected object.
        object_id: ObjectId,
        /// The agent that picked it up.
        collected_by: AgentId,
    },
    /// The set of world objects was (re)generated.
    ObjectsGenerated {
        /// Every object now in the world.
        objects: Vec<WorldObject>,
    },
    /// An agent finished an action (telemetry).
    ActionCompleted {
        /// The agent that finished.
        agent_id: AgentId,
        /// What it finished.
        action: CompletedAction,
    },
    /// The last coin in the world was collected.
    AllCoinsCollected,
    /// The scheduler started driving the simulation.
    SimulationStarted,
    /// The scheduler stopped; agent states are left as they were.
    SimulationStopped,
    /// Agents and collectibles were restored to their initial state.
    SimulationReset,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_are_internally_tagged() {
        let json = serde_json::to_value(WorldEvent::AllCoinsCollected).unwrap();
        assert_eq!(json["type"], "all_coins_collected");

        let json = serde_json::to_value(WorldEvent::ActionCompleted {
            agent_id: AgentId::new("agent2"),
            action: CompletedAction::Move,
        })
        .unwrap();
        assert_eq!(json["type"], "action_completed");
        assert_eq!(json["agent_id"], "agent2");
        assert_eq!(json["action"], "move");
    }
}
