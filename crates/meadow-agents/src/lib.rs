//! Agent state, messaging, and action execution for the Meadow simulation.
//!
//! This crate contains the logic layer for agents -- everything that
//! operates on agent state without touching I/O or the decision oracle.
//! It sits between `meadow-types` (which defines the data structures) and
//! `meadow-core` (which schedules and orchestrates).
//!
//! # Modules
//!
//! - [`actions`] -- The action state machine and its scheduled tasks.
//! - [`config`] -- Speeds and durations ([`ActionTimings`]).
//! - [`error`] -- Error types ([`AgentError`], [`ActionError`]).
//! - [`messaging`] -- Point-to-point text delivery and notifications.
//! - [`registry`] -- The canonical agent store ([`AgentRegistry`]).

pub mod actions;
pub mod config;
pub mod error;
pub mod messaging;
pub mod registry;

// Re-export primary types at crate root for convenience.
pub use actions::{ActionEvent, ActionMachine};
pub use config::ActionTimings;
pub use error::{ActionError, AgentError};
pub use registry::{AgentRegistry, AgentUpdate};
