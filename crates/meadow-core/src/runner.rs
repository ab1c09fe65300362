//! Event scheduler: the async loop that drives a [`Simulation`].
//!
//! This module provides [`run_simulation`], the top-level async function
//! that owns the simulation for the duration of a run and multiplexes:
//!
//! - **Frame timer**: advances movement, speech, and rest timers
//! - **Observation cycle**: diffing, coin collection, watchdog, dispatch
//! - **Oracle answers**: decisions returned by spawned request tasks
//! - **Operator commands**: start, stop, reset, force decision, shutdown
//! - **Bounded runs**: stop after `max_real_time_seconds`
//!
//! Every decision request runs in its own task under a timeout, so a slow
//! or silent oracle can never leave an agent marked in-flight forever. All
//! simulation state is mutated on the loop's task only.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, SimulationClock};
use crate::config::SimulationConfig;
use crate::decision::{DecisionOracle, DecisionOutcome, OracleError};
use crate::operator::{ControlCommand, SimulationEndReason};
use crate::simulation::{PendingDecision, Simulation, SimulationStatus};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The simulation clock failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Timing and bounds for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Period of the observation cycle.
    pub observation_interval: Duration,
    /// Period of timer advancement.
    pub frame_interval: Duration,
    /// How long a single oracle call may take.
    pub decision_timeout: Duration,
    /// Wall-clock bound on the run, if any.
    pub max_real_time: Option<Duration>,
    /// Whether to start the simulation as soon as the loop begins.
    pub auto_start: bool,
}

impl RunnerConfig {
    /// Extract the runner settings from a loaded configuration.
    pub const fn from_config(config: &SimulationConfig) -> Self {
        let max = config.simulation.max_real_time_seconds;
        Self {
            observation_interval: Duration::from_millis(config.timing.observation_interval_ms),
            frame_interval: Duration::from_millis(config.timing.frame_interval_ms),
            decision_timeout: Duration::from_millis(config.timing.decision_timeout_ms),
            max_real_time: if max == 0 {
                None
            } else {
                Some(Duration::from_secs(max))
            },
            auto_start: config.simulation.auto_start,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            observation_interval: Duration::from_millis(500),
            frame_interval: Duration::from_millis(50),
            decision_timeout: Duration::from_secs(15),
            max_real_time: None,
            auto_start: true,
        }
    }
}

/// Result of the simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// The reason the run ended.
    pub end_reason: SimulationEndReason,
    /// Observation cycles executed while running.
    pub cycles: u64,
    /// Final state of the simulation.
    pub status: SimulationStatus,
}

/// Run the simulation until a termination condition is met.
///
/// The simulation is stopped before this function returns. Decision
/// requests still outstanding at that point are abandoned: their agents
/// are released from the in-flight mark and the answers are never applied,
/// so the same simulation can be run again.
///
/// # Arguments
///
/// * `sim` - The simulation to drive
/// * `oracle` - Source of agent decisions (LLM, mock, script)
/// * `config` - Intervals, timeout, and bounds
/// * `control` - Receiving side of a [`control_channel`]
///
/// [`control_channel`]: crate::operator::control_channel
///
/// # Errors
///
/// Returns [`RunnerError`] if the clock fails.
pub async fn run_simulation<O: DecisionOracle>(
    sim: &mut Simulation,
    oracle: Arc<O>,
    config: &RunnerConfig,
    mut control: mpsc::Receiver<ControlCommand>,
) -> Result<SimulationResult, RunnerError> {
    let mut clock = SimulationClock::start();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<DecisionOutcome>();

    let mut frames = tokio::time::interval(config.frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut observations = tokio::time::interval(config.observation_interval);
    observations.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let deadline = config
        .max_real_time
        .and_then(|limit| Instant::now().checked_add(limit));
    let expiry = async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(expiry);

    info!(
        observation_interval_ms = config.observation_interval.as_millis(),
        frame_interval_ms = config.frame_interval.as_millis(),
        decision_timeout_ms = config.decision_timeout.as_millis(),
        max_real_time_seconds = config.max_real_time.map(|d| d.as_secs()),
        "scheduler starting"
    );

    if config.auto_start {
        sim.start(clock.now());
        dispatch(sim.take_requests(), &oracle, &outcome_tx, config.decision_timeout);
    }

    let end_reason = loop {
        tokio::select! {
            () = &mut expiry => {
                info!(
                    max_seconds = config.max_real_time.map(|d| d.as_secs()),
                    "real-time limit reached"
                );
                break SimulationEndReason::MaxRealTimeReached;
            }
            command = control.recv() => match command {
                None | Some(ControlCommand::Shutdown) => {
                    info!("operator shutdown requested");
                    break SimulationEndReason::OperatorStop;
                }
                Some(ControlCommand::Start) => {
                    sim.start(clock.now());
                }
                Some(ControlCommand::Stop) => {
                    sim.stop();
                }
                Some(ControlCommand::Reset) => {
                    sim.reset();
                    oracle.reset().await;
                }
                Some(ControlCommand::ForceDecision(id)) => {
                    if !sim.force_decision(&id, clock.now()) {
                        debug!(agent_id = %id, "forced decision not issued");
                    }
                }
            },
            Some(outcome) = outcome_rx.recv() => {
                sim.apply_outcome(outcome, clock.now());
            }
            _ = frames.tick() => {
                sim.advance_frame(clock.now());
            }
            _ = observations.tick() => {
                if sim.is_running() {
                    sim.observation_cycle(clock.now());
                    clock.record_cycle()?;
                }
            }
        }

        dispatch(sim.take_requests(), &oracle, &outcome_tx, config.decision_timeout);
    };

    sim.stop();
    Ok(SimulationResult {
        end_reason,
        cycles: clock.cycles(),
        status: sim.status(clock.now()),
    })
}

/// Send each pending request to the oracle on its own task.
fn dispatch<O: DecisionOracle>(
    pending: Vec<PendingDecision>,
    oracle: &Arc<O>,
    outcomes: &mpsc::UnboundedSender<DecisionOutcome>,
    timeout: Duration,
) {
    for PendingDecision { request, delay } in pending {
        let oracle = Arc::clone(oracle);
        let outcomes = outcomes.clone();
        info!(
            agent_id = %request.agent_id,
            decision_id = %request.decision_id,
            delay_ms = delay.as_millis(),
            "decision dispatched"
        );

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let agent_id = request.agent_id.clone();
            let decision_id = request.decision_id;
            let result = tokio::time::timeout(timeout, oracle.decide(request))
                .await
                .unwrap_or(Err(OracleError::Timeout(timeout)));
            if outcomes
                .send(DecisionOutcome {
                    agent_id,
                    decision_id,
                    result,
                })
                .is_err()
            {
                debug!(decision_id = %decision_id, "scheduler gone, decision dropped");
            }
        });
    }
}

/// Log the final simulation result.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        cycles = result.cycles,
        simulation_time_ms = result.status.simulation_time_ms,
        coins_remaining = result.status.coins_remaining,
        "simulation ended"
    );

    if result.cycles == 0 {
        warn!("simulation ended with no observation cycles executed");
    }
    for agent in &result.status.agents {
        info!(
            agent_id = %agent.id,
            name = %agent.name,
            action = agent.action.as_str(),
            x = agent.position.x,
            z = agent.position.z,
            coins_collected = agent.coins_collected,
            "final agent state"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use meadow_types::{AgentId, Decision, Position};

    use super::*;
    use crate::decision::ScriptedOracle;
    use crate::operator::control_channel;

    fn simulation() -> Simulation {
        let mut config = SimulationConfig::default();
        config.world.coin_count = 0;
        Simulation::from_config(&config).unwrap()
    }

    fn bounded(seconds: u64) -> RunnerConfig {
        RunnerConfig {
            max_real_time: Some(Duration::from_secs(seconds)),
            ..RunnerConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_by_max_real_time() {
        let mut sim = simulation();
        let oracle = Arc::new(ScriptedOracle::decisions([Decision::idle(), Decision::idle()]));
        let (_handle, rx) = control_channel(4);

        let result = run_simulation(&mut sim, Arc::clone(&oracle), &bounded(3), rx)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxRealTimeReached);
        assert!(result.cycles >= 6);
        assert!(!result.status.running);
        assert_eq!(oracle.calls().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn operator_stop() {
        let mut sim = simulation();
        let oracle = Arc::new(ScriptedOracle::default());
        let (handle, rx) = control_channel(4);
        handle.shutdown().await.unwrap();

        let result = run_simulation(&mut sim, oracle, &RunnerConfig::default(), rx)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert!(!sim.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_ends_run() {
        let mut sim = simulation();
        let (handle, rx) = control_channel(4);
        drop(handle);

        let result = run_simulation(
            &mut sim,
            Arc::new(ScriptedOracle::default()),
            &RunnerConfig::default(),
            rx,
        )
        .await
        .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_oracle_times_out() {
        let mut sim = simulation();
        let oracle = Arc::new(
            ScriptedOracle::decisions([Decision::move_to(0.0, 0.0), Decision::move_to(0.0, 0.0)])
                .with_delay(Duration::from_secs(20)),
        );
        let config = RunnerConfig {
            decision_timeout: Duration::from_secs(1),
            ..bounded(3)
        };
        let (_handle, rx) = control_channel(4);

        let result = run_simulation(&mut sim, Arc::clone(&oracle), &config, rx)
            .await
            .unwrap();

        assert_eq!(oracle.calls().await.len(), 2);
        assert!(result.status.agents.iter().all(|a| !a.decision_in_flight));
        assert!(sim.agents().all().all(|a| a.action.is_idle()));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_command_clears_oracle_memory() {
        let mut sim = simulation();
        let oracle = Arc::new(ScriptedOracle::decisions([
            Decision::move_to(0.0, 0.0),
            Decision::move_to(0.0, 0.0),
        ]));
        let (handle, rx) = control_channel(4);

        let driver = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            handle.reset().await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            handle.shutdown().await.unwrap();
        };
        let config = RunnerConfig::default();
        let (result, ()) = tokio::join!(
            run_simulation(&mut sim, Arc::clone(&oracle), &config, rx),
            driver
        );
        let result = result.unwrap();

        assert_eq!(oracle.resets(), 1);
        assert!(!result.status.running);
        let alice = sim.agents().get(&AgentId::new("agent1")).unwrap();
        assert_eq!(alice.position, Position::new(-2.0, 0.6, 1.0));
    }
}
