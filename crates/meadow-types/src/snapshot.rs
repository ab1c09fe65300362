//! Sensory snapshot payload handed to the decision oracle.
//!
//! The snapshot is the **only** information the oracle receives about the
//! world for one agent. If something is not in the snapshot, the agent
//! does not know about it. Snapshots are derived on demand and never
//! stored beyond the diff cycle that produced them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, ObjectKind};
use crate::ids::{AgentId, ObjectId};
use crate::structs::Position;

/// What one agent can perceive at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SensorySnapshot {
    /// The observing agent.
    pub agent_id: AgentId,
    /// The observing agent's display name.
    pub name: String,
    /// Own position, rounded to two decimals.
    pub position: Position,
    /// Own current action.
    pub action: ActionKind,
    /// Own current utterance, if displayed.
    pub utterance: Option<String>,
    /// Own coin count.
    pub coins_collected: u32,
    /// Coins still lying somewhere in the world.
    pub coins_remaining: u32,
    /// Other agents within the observation radius, nearest first.
    pub nearby_agents: Vec<VisibleAgent>,
    /// World objects within the observation radius, nearest first.
    pub visible_objects: Vec<VisibleObject>,
    /// Simulation clock in milliseconds since start.
    pub simulation_time_ms: u64,
}

/// Another agent as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleAgent {
    /// The other agent's identifier.
    pub id: AgentId,
    /// The other agent's name.
    pub name: String,
    /// Where the other agent stands (rounded).
    pub position: Position,
    /// Planar distance from the observer (rounded).
    pub distance: f64,
    /// What the other agent is doing.
    pub action: ActionKind,
    /// What the other agent is currently saying, if anything.
    pub utterance: Option<String>,
}

/// A world object as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleObject {
    /// The object's identifier.
    pub id: ObjectId,
    /// The object's name.
    pub name: String,
    /// Landmark or collectible.
    pub kind: ObjectKind,
    /// Where the object sits (rounded).
    pub position: Position,
    /// Planar distance from the observer (rounded).
    pub distance: f64,
}

impl SensorySnapshot {
    /// Identifiers of the nearby agents, in snapshot order.
    pub fn agent_ids(&self) -> impl Iterator<Item = &AgentId> {
        self.nearby_agents.iter().map(|a| &a.id)
    }

    /// Identifiers of the visible objects, in snapshot order.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.visible_objects.iter().map(|o| o.id)
    }

    /// One-line descriptions of everything in view, used in prompts and
    /// by the mock oracle.
    pub fn observation_lines(&self) -> Vec<String> {
        let agents = self.nearby_agents.iter().map(|a| match &a.utterance {
            Some(text) => format!(
                "{} is {} at distance {:.1}, saying \"{text}\"",
                a.name,
                a.action.as_str(),
                a.distance
            ),
            None => format!(
                "{} is {} at distance {:.1}",
                a.name,
                a.action.as_str(),
                a.distance
            ),
        });
        let objects = self.visible_objects.iter().map(|o| match o.kind {
            ObjectKind::Collectible => format!(
                "a coin at ({:.1}, {:.1}), distance {:.1}",
                o.position.x, o.position.z, o.distance
            ),
            ObjectKind::Landmark => format!("{} at distance {:.1}", o.name, o.distance),
        });
        agents.chain(objects).collect()
    }
}
