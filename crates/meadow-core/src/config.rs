//! Configuration loading and typed config structures for the Meadow simulation.
//!
//! The canonical configuration lives in `meadow-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, a loader, and [`SimulationConfig::validate`], which rejects
//! rosters and tunables the simulation cannot run with.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the two-agent meadow with Alice and Bob.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use meadow_agents::{ActionTimings, AgentError};
use meadow_types::{AgentColor, AgentId, AgentProfile, Position};
use meadow_world::{CoinLayout, LandmarkSpec, WorldError};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible world.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl From<WorldError> for ConfigError {
    fn from(err: WorldError) -> Self {
        Self::Invalid {
            reason: err.to_string(),
        }
    }
}

impl From<AgentError> for ConfigError {
    fn from(err: AgentError) -> Self {
        Self::Invalid {
            reason: err.to_string(),
        }
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `meadow-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, bounds, collectibles, landmarks).
    #[serde(default)]
    pub world: WorldConfig,

    /// Observation and collection radii.
    #[serde(default)]
    pub sensing: SensingConfig,

    /// Scheduler periods and action durations.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Walking parameters.
    #[serde(default)]
    pub movement: MovementConfig,

    /// Agent roster, in registry order.
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            sensing: SensingConfig::default(),
            timing: TimingConfig::default(),
            movement: MovementConfig::default(),
            agents: default_agents(),
            logging: LoggingConfig::default(),
            simulation: SimulationBoundsConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check that the configuration describes a runnable simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents.is_empty() {
            return Err(invalid("at least one agent must be configured"));
        }
        let mut ids = BTreeSet::new();
        let mut names = BTreeSet::new();
        for agent in &self.agents {
            if agent.id.trim().is_empty() {
                return Err(invalid("agent id must not be empty"));
            }
            if agent.name.trim().is_empty() {
                return Err(invalid(format!("agent {} has an empty name", agent.id)));
            }
            if agent.personality.trim().is_empty() {
                return Err(invalid(format!(
                    "agent {} has an empty personality",
                    agent.id
                )));
            }
            if !ids.insert(agent.id.as_str()) {
                return Err(invalid(format!("duplicate agent id {}", agent.id)));
            }
            if !names.insert(agent.name.as_str()) {
                return Err(invalid(format!("duplicate agent name {}", agent.name)));
            }
        }

        let s = &self.sensing;
        if !positive(s.observation_radius) || !positive(s.collection_radius) {
            return Err(invalid("sensing radii must be positive"));
        }
        if s.collection_radius > s.observation_radius {
            return Err(invalid(
                "collection radius must not exceed observation radius",
            ));
        }

        let t = &self.timing;
        if t.observation_interval_ms == 0 || t.frame_interval_ms == 0 {
            return Err(invalid("scheduler intervals must be non-zero"));
        }
        if t.decision_timeout_ms == 0 {
            return Err(invalid("decision timeout must be non-zero"));
        }
        if !positive(self.movement.speed) {
            return Err(invalid("movement speed must be positive"));
        }
        if self.movement.arrival_epsilon.is_nan() || self.movement.arrival_epsilon < 0.0 {
            return Err(invalid("arrival epsilon must not be negative"));
        }
        self.coin_layout()?;
        Ok(())
    }

    /// Agent profiles in roster order.
    pub fn profiles(&self) -> Vec<AgentProfile> {
        self.agents
            .iter()
            .map(|a| a.profile(self.world.agent_height))
            .collect()
    }

    /// Action machine tunables.
    pub const fn action_timings(&self) -> ActionTimings {
        ActionTimings {
            speed: self.movement.speed,
            arrival_epsilon: self.movement.arrival_epsilon,
            speech_display: Duration::from_millis(self.timing.speech_display_ms),
            rest_duration: Duration::from_millis(self.timing.rest_duration_ms),
            bounds: self.world.bounds,
        }
    }

    /// Coin placement parameters.
    pub fn coin_layout(&self) -> Result<CoinLayout, WorldError> {
        CoinLayout::new(self.world.coin_count, self.world.bounds)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for coin placement.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Half-extent of the walkable square on both planar axes.
    #[serde(default = "default_bounds")]
    pub bounds: f64,

    /// Fixed height at which agents stand.
    #[serde(default = "default_agent_height")]
    pub agent_height: f64,

    /// Coins scattered on load and on every reset.
    #[serde(default = "default_coin_count")]
    pub coin_count: u32,

    /// Static named places.
    #[serde(default = "default_landmarks")]
    pub landmarks: Vec<LandmarkSpec>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            bounds: default_bounds(),
            agent_height: default_agent_height(),
            coin_count: default_coin_count(),
            landmarks: default_landmarks(),
        }
    }
}

/// Perception radii, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SensingConfig {
    /// How far an agent can see.
    #[serde(default = "default_observation_radius")]
    pub observation_radius: f64,

    /// How close an agent must be to pick up a coin.
    #[serde(default = "default_collection_radius")]
    pub collection_radius: f64,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            observation_radius: default_observation_radius(),
            collection_radius: default_collection_radius(),
        }
    }
}

/// Scheduler periods and action durations, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Observation cycle period.
    #[serde(default = "default_observation_interval_ms")]
    pub observation_interval_ms: u64,

    /// Movement frame period.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Idle time after which the watchdog forces a decision.
    #[serde(default = "default_stuck_threshold_ms")]
    pub stuck_threshold_ms: u64,

    /// How long an utterance stays displayed.
    #[serde(default = "default_speech_display_ms")]
    pub speech_display_ms: u64,

    /// How long a rest lasts.
    #[serde(default = "default_rest_duration_ms")]
    pub rest_duration_ms: u64,

    /// Upper bound on a single oracle call.
    #[serde(default = "default_decision_timeout_ms")]
    pub decision_timeout_ms: u64,

    /// Delay between successive agents' initial decisions on start.
    #[serde(default = "default_initial_stagger_ms")]
    pub initial_stagger_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            observation_interval_ms: default_observation_interval_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            stuck_threshold_ms: default_stuck_threshold_ms(),
            speech_display_ms: default_speech_display_ms(),
            rest_duration_ms: default_rest_duration_ms(),
            decision_timeout_ms: default_decision_timeout_ms(),
            initial_stagger_ms: default_initial_stagger_ms(),
        }
    }
}

/// Walking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MovementConfig {
    /// World units per second.
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Distance under which a move target counts as reached.
    #[serde(default = "default_arrival_epsilon")]
    pub arrival_epsilon: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            arrival_epsilon: default_arrival_epsilon(),
        }
    }
}

/// One entry of the agent roster.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// Stable roster key.
    pub id: String,
    /// Display name, also the messaging address.
    pub name: String,
    /// Personality handed to the oracle.
    pub personality: String,
    /// Display color.
    pub color: AgentColor,
    /// Starting point on the plane.
    pub position: SpawnPoint,
}

impl AgentConfig {
    /// Convert into a profile, standing at `height`.
    pub fn profile(&self, height: f64) -> AgentProfile {
        AgentProfile {
            id: AgentId::new(self.id.clone()),
            name: self.name.clone(),
            personality: self.personality.clone(),
            color: self.color,
            initial_position: Position::new(self.position.x, height, self.position.z),
        }
    }
}

/// A point on the movement plane.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpawnPoint {
    /// Horizontal axis.
    pub x: f64,
    /// Depth axis.
    pub z: f64,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Simulation boundary parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum wall-clock seconds before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,

    /// Start the scheduler as soon as the world is loaded.
    #[serde(default = "default_true")]
    pub auto_start: bool,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_real_time_seconds: 0,
            auto_start: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    String::from("Meadow")
}

const fn default_seed() -> u64 {
    42
}

const fn default_bounds() -> f64 {
    4.0
}

const fn default_agent_height() -> f64 {
    0.6
}

const fn default_coin_count() -> u32 {
    5
}

fn default_landmarks() -> Vec<LandmarkSpec> {
    vec![
        LandmarkSpec {
            name: String::from("Old Oak"),
            x: -3.0,
            z: -3.0,
        },
        LandmarkSpec {
            name: String::from("Stone Well"),
            x: 3.0,
            z: -2.5,
        },
    ]
}

const fn default_observation_radius() -> f64 {
    1.0
}

const fn default_collection_radius() -> f64 {
    0.5
}

const fn default_observation_interval_ms() -> u64 {
    500
}

const fn default_frame_interval_ms() -> u64 {
    50
}

const fn default_stuck_threshold_ms() -> u64 {
    5000
}

const fn default_speech_display_ms() -> u64 {
    2500
}

const fn default_rest_duration_ms() -> u64 {
    5000
}

const fn default_decision_timeout_ms() -> u64 {
    15_000
}

const fn default_initial_stagger_ms() -> u64 {
    300
}

const fn default_speed() -> f64 {
    2.0
}

const fn default_arrival_epsilon() -> f64 {
    0.05
}

fn default_agents() -> Vec<AgentConfig> {
    vec![
        AgentConfig {
            id: String::from("agent1"),
            name: String::from("Alice"),
            personality: String::from("Creative and artistic"),
            color: AgentColor::Red,
            position: SpawnPoint { x: -2.0, z: 1.0 },
        },
        AgentConfig {
            id: String::from("agent2"),
            name: String::from("Bob"),
            personality: String::from("Logical and analytical"),
            color: AgentColor::Blue,
            position: SpawnPoint { x: 2.0, z: 1.0 },
        },
    ]
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

const fn default_true() -> bool {
    true
}
