//! Core entity structs for the Meadow simulation.
//!
//! Covers positions on the movement plane, the canonical [`Agent`] record
//! with its [`AgentAction`] state, inbox entries, and [`WorldObject`]s.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, AgentColor, ObjectKind};
use crate::ids::{AgentId, DecisionId, ObjectId};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in the world. `y` is a fixed height; movement happens in the
/// `x`/`z` plane and every distance is measured there.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal axis.
    pub x: f64,
    /// Height above the ground plane.
    pub y: f64,
    /// Depth axis.
    pub z: f64,
}

impl Position {
    /// Create a position from its three coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other` in the `x`/`z` plane.
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }

    /// Whether `other` lies within `radius` of this position (inclusive).
    pub fn within(&self, other: &Self, radius: f64) -> bool {
        self.planar_distance(other) <= radius
    }

    /// Linear interpolation toward `to` on the plane. `t` is clamped to
    /// `[0, 1]`; the height of `self` is preserved.
    pub fn lerp_planar(&self, to: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: (to.x - self.x).mul_add(t, self.x),
            y: self.y,
            z: (to.z - self.z).mul_add(t, self.z),
        }
    }

    /// Copy of this position with each coordinate rounded to `decimals`
    /// places, as presented to the oracle.
    pub fn rounded(&self, decimals: i32) -> Self {
        let scale = 10_f64.powi(decimals);
        Self {
            x: (self.x * scale).round() / scale,
            y: (self.y * scale).round() / scale,
            z: (self.z * scale).round() / scale,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent action state
// ---------------------------------------------------------------------------

/// Where a moving agent is headed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GoalTarget {
    /// A fixed point on the plane.
    Point {
        /// Target x coordinate.
        x: f64,
        /// Target z coordinate.
        z: f64,
    },
    /// Another agent, resolved to its position when the move started.
    Agent {
        /// The agent being approached.
        id: AgentId,
        /// Display name of that agent.
        name: String,
    },
}

/// The action an agent is executing, with any payload it needs.
///
/// The goal target lives inside [`AgentAction::Moving`], so an agent can
/// only ever have a goal while it is moving.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum AgentAction {
    /// Waiting for a decision.
    #[default]
    Idle,
    /// Walking toward `goal`.
    Moving {
        /// Where the agent is headed.
        goal: GoalTarget,
    },
    /// Displaying an utterance.
    Speaking,
    /// Resting.
    Resting,
}

impl AgentAction {
    /// The payload-free kind of this action.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Idle => ActionKind::Idle,
            Self::Moving { .. } => ActionKind::Moving,
            Self::Speaking => ActionKind::Speaking,
            Self::Resting => ActionKind::Resting,
        }
    }

    /// The goal target, present only while moving.
    pub const fn goal_target(&self) -> Option<&GoalTarget> {
        match self {
            Self::Moving { goal } => Some(goal),
            _ => None,
        }
    }

    /// Whether the agent is waiting for a decision.
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

/// An unread text message waiting in an agent's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InboxMessage {
    /// Display name of the sending agent.
    pub sender: String,
    /// Message body.
    pub message: String,
    /// Wall-clock time the message was delivered.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Static description of an agent, taken from the world configuration.
///
/// Used to create the agent at world load and to restore it on reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Stable identifier (roster key).
    pub id: AgentId,
    /// Display name, also used as the addressing key for text messages.
    pub name: String,
    /// Free-form personality description handed to the oracle.
    pub personality: String,
    /// Display color.
    pub color: AgentColor,
    /// Where the agent starts and returns to on reset.
    pub initial_position: Position,
}

/// Canonical mutable state of one simulated agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Personality description.
    pub personality: String,
    /// Display color.
    pub color: AgentColor,
    /// Current position.
    pub position: Position,
    /// Current action (exactly one at a time).
    pub action: AgentAction,
    /// Text currently displayed above the agent.
    pub utterance: Option<String>,
    /// Simulation time at which the utterance display ends.
    pub utterance_expires_at: Option<Duration>,
    /// Coins picked up so far. Never decreases during a run.
    pub coins_collected: u32,
    /// Unread messages, oldest first. Drained on read.
    pub inbox: Vec<InboxMessage>,
    /// Undelivered world notifications, oldest first. Drained on read.
    pub notifications: Vec<String>,
    /// The decision request currently awaiting the oracle, if any.
    pub pending_decision: Option<DecisionId>,
    /// Simulation time of the most recent decision request.
    pub last_decision_at: Option<Duration>,
    /// Simulation time at which the agent last entered `Idle`.
    pub idle_since: Duration,
}

impl Agent {
    /// Create an agent in its initial state from a profile.
    pub fn from_profile(profile: &AgentProfile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            personality: profile.personality.clone(),
            color: profile.color,
            position: profile.initial_position,
            action: AgentAction::Idle,
            utterance: None,
            utterance_expires_at: None,
            coins_collected: 0,
            inbox: Vec::new(),
            notifications: Vec::new(),
            pending_decision: None,
            last_decision_at: None,
            idle_since: Duration::ZERO,
        }
    }

    /// Whether a decision request is outstanding for this agent.
    pub const fn decision_in_flight(&self) -> bool {
        self.pending_decision.is_some()
    }
}

// ---------------------------------------------------------------------------
// World objects
// ---------------------------------------------------------------------------

/// A landmark or collectible placed in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldObject {
    /// Unique identifier.
    pub id: ObjectId,
    /// Display name (e.g. "Fountain", "Coin 3").
    pub name: String,
    /// Where the object sits.
    pub position: Position,
    /// Landmark or collectible.
    pub kind: ObjectKind,
    /// Whether a collectible has been picked up. Always `false` for
    /// landmarks.
    pub collected: bool,
}

impl WorldObject {
    /// Whether agents can currently perceive this object.
    pub const fn is_perceivable(&self) -> bool {
        !self.collected
    }

    /// Whether this is a coin that is still lying in the world.
    pub fn is_available_coin(&self) -> bool {
        self.kind == ObjectKind::Collectible && !self.collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn planar_distance_ignores_height() {
        let a = Position::new(0.0, 0.6, 0.0);
        let b = Position::new(3.0, 10.0, 4.0);
        assert!((a.planar_distance(&b) - 5.0).abs() < EPS);
    }

    #[test]
    fn lerp_clamps_and_keeps_height() {
        let a = Position::new(0.0, 0.6, 0.0);
        let b = Position::new(4.0, 2.0, 0.0);
        let mid = a.lerp_planar(&b, 0.5);
        assert!((mid.x - 2.0).abs() < EPS);
        assert!((mid.y - 0.6).abs() < EPS);
        let past = a.lerp_planar(&b, 3.0);
        assert!((past.x - 4.0).abs() < EPS);
    }

    #[test]
    fn rounding_to_two_places() {
        let p = Position::new(1.23456, 0.6, -2.71828).rounded(2);
        assert!((p.x - 1.23).abs() < EPS);
        assert!((p.z + 2.72).abs() < EPS);
    }

    #[test]
    fn goal_target_only_exists_while_moving() {
        let moving = AgentAction::Moving {
            goal: GoalTarget::Point { x: 1.0, z: 2.0 },
        };
        assert!(moving.goal_target().is_some());
        assert!(AgentAction::Idle.goal_target().is_none());
        assert!(AgentAction::Speaking.goal_target().is_none());
        assert!(AgentAction::Resting.goal_target().is_none());
    }

    #[test]
    fn agent_starts_idle_at_profile_position() {
        let profile = AgentProfile {
            id: AgentId::new("agent1"),
            name: String::from("Alice"),
            personality: String::from("Creative and artistic"),
            color: AgentColor::Red,
            initial_position: Position::new(-2.0, 0.6, 1.0),
        };
        let agent = Agent::from_profile(&profile);
        assert!(agent.action.is_idle());
        assert_eq!(agent.position, profile.initial_position);
        assert_eq!(agent.coins_collected, 0);
        assert!(!agent.decision_in_flight());
    }
}
