//! The Sensory Subsystem: snapshots and observation diffs.
//!
//! [`build_snapshot`] computes what one agent can perceive right now: every
//! other agent and every uncollected world object within the observation
//! radius, measured on the `x`/`z` plane.
//!
//! [`SensorySystem`] keeps the previous set of perceived ids per agent and,
//! each observation cycle, reports the four enter/leave categories as set
//! differences. The new sets replace the previous ones unconditionally,
//! whether or not anyone acts on the resulting triggers. Observation is
//! edge-triggered: a static scene is reported once, not every cycle.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use meadow_agents::AgentRegistry;
use meadow_types::{
    Agent, AgentId, ObjectId, SensorySnapshot, VisibleAgent, VisibleObject,
};
use meadow_world::WorldRegistry;

use crate::trigger::Trigger;

/// Decimal places positions and distances are rounded to in snapshots.
const SNAPSHOT_DECIMALS: i32 = 2;

fn round(v: f64) -> f64 {
    let scale = 10_f64.powi(SNAPSHOT_DECIMALS);
    (v * scale).round() / scale
}

/// Build the snapshot for `agent` at simulation time `now`.
pub fn build_snapshot(
    agent: &Agent,
    agents: &AgentRegistry,
    world: &WorldRegistry,
    radius: f64,
    now: Duration,
) -> SensorySnapshot {
    let mut nearby_agents: Vec<VisibleAgent> = agents
        .all()
        .filter(|other| other.id != agent.id)
        .filter_map(|other| {
            let distance = agent.position.planar_distance(&other.position);
            (distance <= radius).then(|| VisibleAgent {
                id: other.id.clone(),
                name: other.name.clone(),
                position: other.position.rounded(SNAPSHOT_DECIMALS),
                distance,
                action: other.action.kind(),
                utterance: other.utterance.clone(),
            })
        })
        .collect();
    nearby_agents.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    for a in &mut nearby_agents {
        a.distance = round(a.distance);
    }

    let mut visible_objects: Vec<VisibleObject> = world
        .perceivable()
        .filter_map(|object| {
            let distance = agent.position.planar_distance(&object.position);
            (distance <= radius).then(|| VisibleObject {
                id: object.id,
                name: object.name.clone(),
                kind: object.kind,
                position: object.position.rounded(SNAPSHOT_DECIMALS),
                distance,
            })
        })
        .collect();
    visible_objects.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    for o in &mut visible_objects {
        o.distance = round(o.distance);
    }

    SensorySnapshot {
        agent_id: agent.id.clone(),
        name: agent.name.clone(),
        position: agent.position.rounded(SNAPSHOT_DECIMALS),
        action: agent.action.kind(),
        utterance: agent.utterance.clone(),
        coins_collected: agent.coins_collected,
        coins_remaining: world.coins_remaining(),
        nearby_agents,
        visible_objects,
        simulation_time_ms: u64::try_from(now.as_millis()).unwrap_or(u64::MAX),
    }
}

// ---------------------------------------------------------------------------
// Diffing
// ---------------------------------------------------------------------------

/// Ids perceived by one agent in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Perceived {
    /// Agents within the observation radius.
    pub agents: BTreeSet<AgentId>,
    /// World objects within the observation radius.
    pub objects: BTreeSet<ObjectId>,
}

impl From<&SensorySnapshot> for Perceived {
    fn from(snapshot: &SensorySnapshot) -> Self {
        Self {
            agents: snapshot.agent_ids().cloned().collect(),
            objects: snapshot.object_ids().collect(),
        }
    }
}

/// What changed between two consecutive observations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationDiff {
    /// Agents that came into range.
    pub new_agents: Vec<AgentId>,
    /// Agents that went out of range.
    pub agents_left: Vec<AgentId>,
    /// Objects that came into range.
    pub new_objects: Vec<ObjectId>,
    /// Objects that went out of range or were collected.
    pub objects_left: Vec<ObjectId>,
}

impl ObservationDiff {
    /// Set differences between `previous` and `current`.
    pub fn between(previous: &Perceived, current: &Perceived) -> Self {
        Self {
            new_agents: current.agents.difference(&previous.agents).cloned().collect(),
            agents_left: previous.agents.difference(&current.agents).cloned().collect(),
            new_objects: current.objects.difference(&previous.objects).copied().collect(),
            objects_left: previous.objects.difference(&current.objects).copied().collect(),
        }
    }

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.new_agents.is_empty()
            && self.agents_left.is_empty()
            && self.new_objects.is_empty()
            && self.objects_left.is_empty()
    }

    /// One trigger per non-empty category.
    pub fn into_triggers(self) -> Vec<Trigger> {
        let mut triggers = Vec::new();
        if !self.new_agents.is_empty() {
            triggers.push(Trigger::NewAgents(self.new_agents));
        }
        if !self.agents_left.is_empty() {
            triggers.push(Trigger::AgentsLeft(self.agents_left));
        }
        if !self.new_objects.is_empty() {
            triggers.push(Trigger::NewObjects(self.new_objects));
        }
        if !self.objects_left.is_empty() {
            triggers.push(Trigger::ObjectsLeft(self.objects_left));
        }
        triggers
    }
}

/// Per-agent memory of the previous observation.
#[derive(Debug, Clone, Default)]
pub struct SensorySystem {
    previous: BTreeMap<AgentId, Perceived>,
}

impl SensorySystem {
    /// A system with no previous observations.
    pub const fn new() -> Self {
        Self {
            previous: BTreeMap::new(),
        }
    }

    /// Diff `snapshot` against the agent's previous observation and make
    /// it the new previous one. An agent never observed before diffs
    /// against an empty scene.
    pub fn observe(&mut self, snapshot: &SensorySnapshot) -> ObservationDiff {
        let current = Perceived::from(snapshot);
        let previous = self
            .previous
            .insert(snapshot.agent_id.clone(), current.clone())
            .unwrap_or_default();
        ObservationDiff::between(&previous, &current)
    }

    /// Discard the agent's previous observation so everything in range is
    /// reported again next cycle.
    pub fn forget(&mut self, agent: &AgentId) {
        self.previous.remove(agent);
    }

    /// Discard every previous observation.
    pub fn clear(&mut self) {
        self.previous.clear();
    }
}
