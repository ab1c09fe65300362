//! Decision oracle trait and scripted implementation.
//!
//! When an agent needs to choose what to do next, the broker packages its
//! sensory snapshot, unread messages, and identity into a
//! [`DecisionRequest`] and hands it to a [`DecisionOracle`]. The oracle
//! could be a language model, a rule-based mock, or a test script; the
//! scheduler only cares that it eventually returns a [`Decision`] or an
//! [`OracleError`].
//!
//! [`ScriptedOracle`] replays a fixed queue of responses and records every
//! request it receives. It exists for tests in this crate and downstream.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use meadow_types::{
    AgentId, AgentProfile, Decision, DecisionId, InboxMessage, SensorySnapshot,
};
use serde::Serialize;
use tokio::sync::Mutex;

/// Errors an oracle can report instead of a decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The request never reached the backend.
    #[error("oracle transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("oracle returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The backend answered but no decision could be extracted.
    #[error("could not parse oracle response: {0}")]
    Parse(String),

    /// The backend did not answer within the deadline.
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    /// The oracle has nothing to offer.
    #[error("oracle produced no decision: {0}")]
    NoDecision(String),
}

/// Everything an oracle sees when asked to decide for one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRequest {
    /// The deciding agent.
    pub agent_id: AgentId,
    /// Identifier the response must carry back to the broker.
    pub decision_id: DecisionId,
    /// The deciding agent's identity and personality.
    pub profile: AgentProfile,
    /// Every other agent in the world, in roster order.
    pub roster: Vec<AgentProfile>,
    /// What the agent perceives right now.
    pub snapshot: SensorySnapshot,
    /// Messages drained from the inbox for this request, oldest first.
    pub messages: Vec<InboxMessage>,
    /// World notifications drained for this request, oldest first.
    pub notifications: Vec<String>,
}

/// The oracle's answer to one [`DecisionRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOutcome {
    /// The agent the request was for.
    pub agent_id: AgentId,
    /// The request identifier.
    pub decision_id: DecisionId,
    /// The decision, or why there is none.
    pub result: Result<Decision, OracleError>,
}

/// A source of agent decisions.
///
/// Implementations must be shareable across tasks: the runner calls
/// [`decide`](Self::decide) from a spawned task per request, so several
/// requests for different agents can be outstanding at once.
pub trait DecisionOracle: Send + Sync + 'static {
    /// Produce a decision for `request`.
    fn decide(
        &self,
        request: DecisionRequest,
    ) -> impl Future<Output = Result<Decision, OracleError>> + Send;

    /// Forget any per-agent state. Called when the simulation is reset.
    fn reset(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

// ---------------------------------------------------------------------------
// Scripted oracle
// ---------------------------------------------------------------------------

/// Replays queued responses in order and records every request.
///
/// When the script runs out, every further request fails with
/// [`OracleError::NoDecision`].
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Result<Decision, OracleError>>>,
    calls: Mutex<Vec<DecisionRequest>>,
    resets: AtomicUsize,
    delay: Duration,
}

impl ScriptedOracle {
    /// An oracle that answers with `script`, one entry per request.
    pub fn new(script: impl IntoIterator<Item = Result<Decision, OracleError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// An oracle that answers with `decisions`, one per request.
    pub fn decisions(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self::new(decisions.into_iter().map(Ok))
    }

    /// Wait `delay` before answering each request.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Append a response to the script.
    pub async fn push(&self, response: Result<Decision, OracleError>) {
        self.script.lock().await.push_back(response);
    }

    /// Every request received so far, in arrival order.
    pub async fn calls(&self) -> Vec<DecisionRequest> {
        self.calls.lock().await.clone()
    }

    /// How many times [`DecisionOracle::reset`] was called.
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::Acquire)
    }
}

impl DecisionOracle for ScriptedOracle {
    async fn decide(&self, request: DecisionRequest) -> Result<Decision, OracleError> {
        self.calls.lock().await.push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::NoDecision(String::from("script exhausted"))))
    }

    async fn reset(&self) {
        self.resets.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use meadow_types::{ActionKind, AgentColor, Position};

    use super::*;

    fn request(agent: &str) -> DecisionRequest {
        let profile = AgentProfile {
            id: AgentId::new(agent),
            name: String::from("Alice"),
            personality: String::from("Curious"),
            color: AgentColor::Red,
            initial_position: Position::default(),
        };
        DecisionRequest {
            agent_id: profile.id.clone(),
            decision_id: DecisionId(1),
            snapshot: SensorySnapshot {
                agent_id: profile.id.clone(),
                name: profile.name.clone(),
                position: Position::default(),
                action: ActionKind::Idle,
                utterance: None,
                coins_collected: 0,
                coins_remaining: 0,
                nearby_agents: Vec::new(),
                visible_objects: Vec::new(),
                simulation_time_ms: 0,
            },
            profile,
            roster: Vec::new(),
            messages: Vec::new(),
            notifications: Vec::new(),
        }
    }

    #[tokio::test]
    async fn replays_script_then_runs_dry() {
        let oracle = ScriptedOracle::decisions([Decision::idle(), Decision::move_to(1.0, 2.0)]);

        assert_eq!(oracle.decide(request("a")).await, Ok(Decision::idle()));
        assert_eq!(
            oracle.decide(request("b")).await,
            Ok(Decision::move_to(1.0, 2.0))
        );
        assert!(matches!(
            oracle.decide(request("a")).await,
            Err(OracleError::NoDecision(_))
        ));

        let calls = oracle.calls().await;
        let ids: Vec<_> = calls.iter().map(|c| c.agent_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "a"]);
    }

    #[tokio::test]
    async fn counts_resets() {
        let oracle = ScriptedOracle::default();
        oracle.reset().await;
        oracle.reset().await;
        assert_eq!(oracle.resets(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_holds_the_answer() {
        let oracle = ScriptedOracle::decisions([Decision::idle()])
            .with_delay(Duration::from_secs(3));
        let started = tokio::time::Instant::now();
        oracle.decide(request("a")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
