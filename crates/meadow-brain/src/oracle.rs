//! Decision oracle implementations.
//!
//! [`LlmOracle`] asks a language model, remembering past decisions and
//! observations per agent. [`MockOracle`] follows a few random rules and
//! needs no network. [`Brain`] wraps either behind one type so the engine
//! can pick at startup.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use meadow_core::{DecisionOracle, DecisionRequest, OracleError};
use meadow_types::{Decision, ObjectKind, SensorySnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::LlmConfig;
use crate::error::BrainError;
use crate::llm::LlmClient;
use crate::memory::{MemoryEntry, MemoryStore};
use crate::prompt::PromptEngine;

/// What the mock oracle says when greeting someone.
pub const MOCK_GREETING: &str = "Hello there! How's your coin hunting going?";

// ---------------------------------------------------------------------------
// LLM oracle
// ---------------------------------------------------------------------------

/// Decides by prompting an OpenAI-compatible model.
#[derive(Debug)]
pub struct LlmOracle {
    client: LlmClient,
    prompts: PromptEngine,
    memory: MemoryStore,
}

impl LlmOracle {
    /// Build an oracle for `config`, loading template overrides if set.
    pub fn new(config: LlmConfig) -> Result<Self, BrainError> {
        let prompts = match &config.templates_dir {
            Some(dir) => PromptEngine::from_dir(dir)?,
            None => PromptEngine::new()?,
        };
        let memory = MemoryStore::new(config.memory_limit);
        Ok(Self {
            client: LlmClient::new(config)?,
            prompts,
            memory,
        })
    }

    /// Per-agent memory.
    pub const fn memory(&self) -> &MemoryStore {
        &self.memory
    }
}

impl DecisionOracle for LlmOracle {
    async fn decide(&self, request: DecisionRequest) -> Result<Decision, OracleError> {
        let agent_id = request.agent_id.clone();
        let time_s = request.snapshot.simulation_time_ms / 1000;

        let generation = self.memory.generation().await;
        let memory = self.memory.recall(&agent_id).await;
        let prompt = self.prompts.render(&request, &memory)?;
        self.memory
            .remember_observation(
                &agent_id,
                generation,
                MemoryEntry {
                    time_s,
                    summary: observation_summary(&request.snapshot),
                },
            )
            .await;

        debug!(
            agent_id = %agent_id,
            model = %self.client.config().model,
            prompt_chars = prompt.system.len().saturating_add(prompt.user.len()),
            remembered_decisions = memory.decisions.len(),
            "calling LLM"
        );
        let decision = self.client.complete(&prompt).await?;

        let remembered = self
            .memory
            .remember_decision(
                &agent_id,
                generation,
                MemoryEntry {
                    time_s,
                    summary: decision.summary(),
                },
            )
            .await;
        if !remembered {
            debug!(agent_id = %agent_id, "memory reset during call, decision not remembered");
        }
        Ok(decision)
    }

    async fn reset(&self) {
        self.memory.clear().await;
        info!("LLM oracle memory cleared");
    }
}

/// One-line summary of a snapshot for the agent's observation memory.
fn observation_summary(snapshot: &SensorySnapshot) -> String {
    let lines = snapshot.observation_lines();
    let seen = if lines.is_empty() {
        String::from("nothing nearby")
    } else {
        lines.join("; ")
    };
    format!(
        "at ({:.1}, {:.1}) saw {seen}",
        snapshot.position.x, snapshot.position.z
    )
}

// ---------------------------------------------------------------------------
// Mock oracle
// ---------------------------------------------------------------------------

/// Rule-based oracle for running without a model.
///
/// Heads for the nearest visible coin, sometimes greets a visible agent,
/// and otherwise wanders. Targets may fall outside the world; the action
/// machine clamps them.
#[derive(Debug)]
pub struct MockOracle {
    rng: Mutex<StdRng>,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    /// A mock seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// A mock with reproducible choices.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick a decision for `request`.
    pub fn choose(&self, request: &DecisionRequest) -> Decision {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = &request.snapshot;
        let here = snapshot.position;

        let nearest_coin = snapshot
            .visible_objects
            .iter()
            .find(|o| o.kind == ObjectKind::Collectible);
        if let Some(coin) = nearest_coin {
            return Decision::move_to(
                coin.position.x + rng.random_range(-0.2..0.2),
                coin.position.z + rng.random_range(-0.2..0.2),
            );
        }

        if let Some(other) = snapshot.nearby_agents.first() {
            if rng.random_bool(0.5) {
                return Decision::text(other.name.clone(), MOCK_GREETING);
            }
            return Decision::move_to(
                here.x + rng.random_range(-3.0..3.0),
                here.z + rng.random_range(-3.0..3.0),
            );
        }

        Decision::move_to(
            here.x + rng.random_range(-2.0..2.0),
            here.z + rng.random_range(-2.0..2.0),
        )
    }
}

impl DecisionOracle for MockOracle {
    fn decide(
        &self,
        request: DecisionRequest,
    ) -> impl Future<Output = Result<Decision, OracleError>> + Send {
        let decision = self.choose(&request);
        debug!(agent_id = %request.agent_id, decision = %decision.summary(), "mock decision");
        std::future::ready(Ok(decision))
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Either oracle, chosen at startup.
///
/// Uses enum dispatch because [`DecisionOracle`] has async methods and is
/// not dyn-compatible.
#[derive(Debug)]
pub enum Brain {
    /// A language model behind an OpenAI-compatible API.
    Llm(LlmOracle),
    /// The offline rule-based mock.
    Mock(MockOracle),
}

impl Brain {
    /// Use the LLM when `config` is present, the mock otherwise.
    pub fn from_config(config: Option<LlmConfig>) -> Result<Self, BrainError> {
        match config {
            Some(config) => {
                info!(api_url = %config.api_url, model = %config.model, "using LLM oracle");
                Ok(Self::Llm(LlmOracle::new(config)?))
            }
            None => {
                info!("LLM_API_URL not set, using mock oracle");
                Ok(Self::Mock(MockOracle::new()))
            }
        }
    }

    /// Read `LLM_*` environment variables and pick an oracle.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::from_config(LlmConfig::from_env()?)
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Llm(_) => "llm",
            Self::Mock(_) => "mock",
        }
    }
}

impl DecisionOracle for Brain {
    async fn decide(&self, request: DecisionRequest) -> Result<Decision, OracleError> {
        match self {
            Self::Llm(oracle) => oracle.decide(request).await,
            Self::Mock(oracle) => oracle.decide(request).await,
        }
    }

    async fn reset(&self) {
        match self {
            Self::Llm(oracle) => oracle.reset().await,
            Self::Mock(oracle) => oracle.reset().await,
        }
    }
}
