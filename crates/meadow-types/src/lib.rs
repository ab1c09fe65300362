//! Shared type definitions for the Meadow agent simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Meadow workspace. Types that reach the render layer flow downstream to
//! `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier wrappers for agents, objects, and decisions
//! - [`enums`] -- Enumeration types (action kinds, decision actions, colors)
//! - [`structs`] -- Core entity structs (positions, agents, world objects)
//! - [`snapshot`] -- Sensory snapshot delivered to the decision oracle
//! - [`decision`] -- Decisions returned by the oracle
//! - [`events`] -- Events emitted toward the render layer

pub mod decision;
pub mod enums;
pub mod events;
pub mod ids;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use decision::{Decision, DecisionTarget};
pub use enums::{ActionKind, AgentColor, CompletedAction, DecisionAction, ObjectKind};
pub use events::WorldEvent;
pub use ids::{AgentId, DecisionId, ObjectId};
pub use snapshot::{SensorySnapshot, VisibleAgent, VisibleObject};
pub use structs::{
    Agent, AgentAction, AgentProfile, GoalTarget, InboxMessage, Position, WorldObject,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to the `bindings/` directory relative to the
        // crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::ObjectId::export_all();

        // Enums
        let _ = crate::enums::ActionKind::export_all();
        let _ = crate::enums::CompletedAction::export_all();
        let _ = crate::enums::DecisionAction::export_all();
        let _ = crate::enums::ObjectKind::export_all();
        let _ = crate::enums::AgentColor::export_all();

        // Structs
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::GoalTarget::export_all();
        let _ = crate::structs::InboxMessage::export_all();
        let _ = crate::structs::WorldObject::export_all();

        // Snapshot, decisions, events
        let _ = crate::snapshot::SensorySnapshot::export_all();
        let _ = crate::snapshot::VisibleAgent::export_all();
        let _ = crate::snapshot::VisibleObject::export_all();
        let _ = crate::decision::Decision::export_all();
        let _ = crate::decision::DecisionTarget::export_all();
        let _ = crate::events::WorldEvent::export_all();
    }
}
