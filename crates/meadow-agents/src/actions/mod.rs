//! Action execution: turning decisions into timed agent behavior.
//!
//! # Submodules
//!
//! - [`machine`] -- The Idle/Moving/Speaking/Resting state machine.
//! - [`movement`] -- Straight-line constant-speed walk planning.
//! - [`tasks`] -- Per-agent scheduled tasks with cancellation.

pub mod machine;
pub mod movement;
pub mod tasks;

pub use machine::{ActionEvent, ActionMachine};
pub use movement::MovementPlan;
pub use tasks::{TaskKind, TaskSet};
