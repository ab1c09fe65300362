//! Engine binary for the Meadow agent simulation.
//!
//! Wires together configuration, the world, the decision oracle, and the
//! scheduler loop, then runs until the configured time limit or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `meadow-config.yaml` (or `MEADOW_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Validate configuration
//! 4. Pick the decision oracle (LLM when `LLM_API_URL` is set, mock otherwise)
//! 5. Build the simulation with a logging observer
//! 6. Route Ctrl-C to the control channel
//! 7. Run the scheduler loop
//! 8. Log the result

mod error;
mod log_observer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use meadow_brain::Brain;
use meadow_core::config::LoggingConfig;
use meadow_core::operator::control_channel;
use meadow_core::runner::{self, RunnerConfig};
use meadow_core::{Simulation, SimulationConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_observer::TracingObserver;

/// Config file looked up in the working directory.
const DEFAULT_CONFIG_PATH: &str = "meadow-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the run itself fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is not up yet, so report the source
    //    once it is.
    let config_path = std::env::var("MEADOW_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, loaded_from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("meadow-engine starting");
    if loaded_from_file {
        info!(path = %config_path.display(), "configuration file loaded");
    } else {
        info!(path = %config_path.display(), "config file not found, using defaults");
    }

    // 3. Validate.
    config.validate()?;
    info!(
        world_name = %config.world.name,
        seed = config.world.seed,
        agents = config.agents.len(),
        coin_count = config.world.coin_count,
        observation_interval_ms = config.timing.observation_interval_ms,
        decision_timeout_ms = config.timing.decision_timeout_ms,
        "configuration validated"
    );

    // 4. Pick the oracle.
    let brain = Arc::new(Brain::from_env()?);
    info!(oracle = brain.name(), "decision oracle ready");

    // 5. Build the simulation.
    let mut sim = Simulation::from_config(&config)?.with_observer(TracingObserver::new());
    let runner_config = RunnerConfig::from_config(&config);
    info!(
        max_real_time_seconds = config.simulation.max_real_time_seconds,
        auto_start = runner_config.auto_start,
        "simulation assembled, entering scheduler loop"
    );

    // 6. Ctrl-C asks the loop to shut down.
    let (control, control_rx) = control_channel(16);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                if control.shutdown().await.is_err() {
                    warn!("run loop already finished");
                }
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    // 7. Run.
    let result = runner::run_simulation(&mut sim, brain, &runner_config, control_rx).await?;

    // 8. Report.
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        cycles = result.cycles,
        "meadow-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `path`.
///
/// A missing file is not an error: the built-in two-agent meadow is used.
/// Returns whether the file was found.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level; `format: json` switches to
/// one JSON object per line.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
