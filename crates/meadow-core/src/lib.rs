//! Scheduling and orchestration for the Meadow agent simulation.
//!
//! This crate owns the event-driven core: it decides *when* an agent should
//! be asked for a decision, guarantees at most one outstanding request per
//! agent, and keeps every agent live through the stuck-agent watchdog.
//!
//! # Modules
//!
//! - [`broker`] -- Decision Broker with the in-flight guard.
//! - [`clock`] -- Monotonic simulation clock and cycle counter.
//! - [`collection`] -- Proximity coin collection and tie-breaking.
//! - [`config`] -- Configuration loading from `meadow-config.yaml` into
//!   strongly-typed structs.
//! - [`decision`] -- [`DecisionOracle`] trait and [`ScriptedOracle`].
//! - [`observer`] -- [`WorldObserver`] sinks for render events.
//! - [`operator`] -- Lifecycle commands sent to a running loop.
//! - [`runner`] -- The async scheduler loop.
//! - [`sensory`] -- Sensory snapshots and observation diffs.
//! - [`simulation`] -- The [`Simulation`] aggregate that owns all state.
//! - [`trigger`] -- Interest triggers and the dispatcher queue.
//!
//! [`DecisionOracle`]: decision::DecisionOracle
//! [`ScriptedOracle`]: decision::ScriptedOracle
//! [`WorldObserver`]: observer::WorldObserver
//! [`Simulation`]: simulation::Simulation

pub mod broker;
pub mod clock;
pub mod collection;
pub mod config;
pub mod decision;
pub mod observer;
pub mod operator;
pub mod runner;
pub mod sensory;
pub mod simulation;
pub mod trigger;

pub use config::{ConfigError, SimulationConfig};
pub use decision::{DecisionOracle, DecisionOutcome, DecisionRequest, OracleError};
pub use simulation::{Simulation, SimulationSettings, SimulationStatus};
