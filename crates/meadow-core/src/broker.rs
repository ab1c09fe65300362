//! The Decision Broker.
//!
//! Guarantees at most one in-flight decision request per agent. A request
//! is built by [`DecisionBroker::begin`], which marks the agent as pending
//! and drains its inbox into the request. The oracle's answer comes back
//! through [`DecisionBroker::finish`], which clears the pending mark only
//! if the answer belongs to the request currently outstanding. Answers to
//! requests that were superseded by a stop or reset are discarded.

use std::time::Duration;

use meadow_agents::{AgentError, AgentRegistry, messaging};
use meadow_types::{AgentId, Decision, DecisionId};
use meadow_world::WorldRegistry;
use tracing::{debug, warn};

use crate::decision::{DecisionOutcome, DecisionRequest};
use crate::sensory::build_snapshot;

/// Issues decision requests and accepts their outcomes.
#[derive(Debug, Clone, Default)]
pub struct DecisionBroker {
    last_id: DecisionId,
}

impl DecisionBroker {
    /// A broker that has issued nothing yet.
    pub const fn new() -> Self {
        Self {
            last_id: DecisionId(0),
        }
    }

    /// Start a decision for `id` unless one is already in flight.
    ///
    /// Returns `Ok(None)` when the agent already has a pending request;
    /// the new trigger is dropped. Otherwise the agent is marked pending,
    /// its inbox and notifications are drained into the request, and the
    /// snapshot is taken at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] for an unknown agent.
    pub fn begin(
        &mut self,
        agents: &mut AgentRegistry,
        world: &WorldRegistry,
        id: &AgentId,
        observation_radius: f64,
        now: Duration,
    ) -> Result<Option<DecisionRequest>, AgentError> {
        let agent = agents.require(id)?;
        if let Some(pending) = agent.pending_decision {
            debug!(agent_id = %id, pending = %pending, "decision already in flight, trigger dropped");
            return Ok(None);
        }

        let snapshot = build_snapshot(agent, agents, world, observation_radius, now);
        let profile = agents
            .profile(id)
            .cloned()
            .ok_or_else(|| AgentError::AgentNotFound(id.clone()))?;
        let roster = agents
            .profiles()
            .iter()
            .filter(|p| &p.id != id)
            .cloned()
            .collect();

        self.last_id = self.last_id.next();
        let decision_id = self.last_id;

        let messages = messaging::drain_inbox(agents, id)?;
        let notifications = messaging::drain_notifications(agents, id)?;
        let agent = agents.require_mut(id)?;
        agent.pending_decision = Some(decision_id);
        agent.last_decision_at = Some(now);

        debug!(
            agent_id = %id,
            decision_id = %decision_id,
            messages = messages.len(),
            notifications = notifications.len(),
            "decision requested"
        );

        Ok(Some(DecisionRequest {
            agent_id: id.clone(),
            decision_id,
            profile,
            roster,
            snapshot,
            messages,
            notifications,
        }))
    }

    /// Accept an oracle outcome.
    ///
    /// Returns the decision to execute, or `None` when the outcome is stale
    /// or unknown to this broker, or the oracle failed. A failed outcome
    /// still clears the pending mark, leaving the agent idle until the next
    /// trigger.
    pub fn finish(&self, agents: &mut AgentRegistry, outcome: DecisionOutcome) -> Option<Decision> {
        let DecisionOutcome {
            agent_id,
            decision_id,
            result,
        } = outcome;

        if decision_id > self.last_id {
            warn!(agent_id = %agent_id, decision_id = %decision_id, "outcome for a request never issued");
            return None;
        }
        let Ok(agent) = agents.require_mut(&agent_id) else {
            return None;
        };
        if agent.pending_decision != Some(decision_id) {
            debug!(
                agent_id = %agent_id,
                decision_id = %decision_id,
                "stale decision discarded"
            );
            return None;
        }
        agent.pending_decision = None;

        match result {
            Ok(decision) => {
                debug!(
                    agent_id = %agent_id,
                    decision_id = %decision_id,
                    decision = %decision.summary(),
                    "decision received"
                );
                Some(decision)
            }
            Err(e) => {
                warn!(
                    agent_id = %agent_id,
                    decision_id = %decision_id,
                    error = %e,
                    "decision failed"
                );
                None
            }
        }
    }

    /// Identifier of the most recently issued request.
    pub const fn last_id(&self) -> DecisionId {
        self.last_id
    }
}
