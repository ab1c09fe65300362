//! Operator control surface for a running simulation.
//!
//! The runner owns the [`Simulation`](crate::simulation::Simulation)
//! exclusively, so outside callers (the engine binary's signal handler, a
//! future control API, tests) steer it by sending [`ControlCommand`]s over
//! a bounded channel. [`ControlHandle`] is the cloneable sending side.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use meadow_types::AgentId;

/// Reason why the run loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator asked for shutdown, or every control handle was dropped.
    OperatorStop,
}

/// A lifecycle command for the run loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Start (or restart) the simulation.
    Start,
    /// Stop the simulation, leaving agent state as is.
    Stop,
    /// Stop and restore the initial world.
    Reset,
    /// Ask the oracle for a decision for one idle agent.
    ForceDecision(AgentId),
    /// Leave the run loop.
    Shutdown,
}

/// Error returned when the run loop is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("simulation run loop is no longer accepting commands")]
pub struct ControlClosed;

impl From<mpsc::error::SendError<ControlCommand>> for ControlClosed {
    fn from(_: mpsc::error::SendError<ControlCommand>) -> Self {
        Self
    }
}

/// Cloneable handle for sending commands to the run loop.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<ControlCommand>,
}

/// Create a control channel with room for `capacity` queued commands.
pub fn control_channel(capacity: usize) -> (ControlHandle, mpsc::Receiver<ControlCommand>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ControlHandle { tx }, rx)
}

impl ControlHandle {
    /// Send a raw command.
    ///
    /// # Errors
    ///
    /// Returns [`ControlClosed`] if the run loop has exited.
    pub async fn send(&self, command: ControlCommand) -> Result<(), ControlClosed> {
        self.tx.send(command).await?;
        Ok(())
    }

    /// Start the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ControlClosed`] if the run loop has exited.
    pub async fn start(&self) -> Result<(), ControlClosed> {
        self.send(ControlCommand::Start).await
    }

    /// Stop the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ControlClosed`] if the run loop has exited.
    pub async fn stop(&self) -> Result<(), ControlClosed> {
        self.send(ControlCommand::Stop).await
    }

    /// Reset the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ControlClosed`] if the run loop has exited.
    pub async fn reset(&self) -> Result<(), ControlClosed> {
        self.send(ControlCommand::Reset).await
    }

    /// Force a decision for `agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlClosed`] if the run loop has exited.
    pub async fn force_decision(&self, agent: AgentId) -> Result<(), ControlClosed> {
        self.send(ControlCommand::ForceDecision(agent)).await
    }

    /// Leave the run loop.
    ///
    /// # Errors
    ///
    /// Returns [`ControlClosed`] if the run loop has already exited.
    pub async fn shutdown(&self) -> Result<(), ControlClosed> {
        self.send(ControlCommand::Shutdown).await
    }

    /// Whether the run loop has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
