//! The action execution state machine.
//!
//! ```text
//!            move            arrival
//!   Idle ─────────▶ Moving ───────────▶ Idle   + completion(move)
//!   Idle ─────────▶ Speaking ─────────▶ Idle   + completion(text)
//!            text            window
//!   Idle ─────────▶ Resting ──────────▶ Idle   + completion(idle)
//!            idle            rest
//!   any  ─────────▶ Idle                        (interrupt, no completion)
//! ```
//!
//! Decisions are validated in full before any state changes, so a
//! malformed decision leaves the agent exactly as it was. Timed phases run
//! as entries in the machine's [`TaskSet`] and are advanced by
//! [`ActionMachine::advance`], called once per frame.

use std::time::Duration;

use meadow_types::{
    AgentAction, AgentId, CompletedAction, Decision, DecisionAction, DecisionTarget, GoalTarget,
    Position,
};
use tracing::{debug, info, warn};

use super::movement::MovementPlan;
use super::tasks::{TaskKind, TaskSet};
use crate::config::ActionTimings;
use crate::error::{ActionError, AgentError};
use crate::messaging;
use crate::registry::{AgentRegistry, AgentUpdate};

/// Something the machine did that the caller may need to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    /// The agent's position, action, or utterance changed.
    Updated(AgentId),
    /// The agent finished an action and is `Idle` again.
    Completed {
        /// The agent.
        agent_id: AgentId,
        /// What it finished.
        action: CompletedAction,
    },
    /// A text message was placed in another agent's inbox.
    TextDelivered {
        /// Sender.
        from: AgentId,
        /// Recipient.
        to: AgentId,
    },
    /// The agent asked for a fresh look at its surroundings.
    Observed(AgentId),
}

/// A decision that passed validation.
enum Planned {
    Move { goal: GoalTarget, to: Position },
    Text { recipient: String, utterance: String },
    Rest,
    Observe,
}

/// Drives agents between `Idle`, `Moving`, `Speaking`, and `Resting`.
#[derive(Debug, Clone)]
pub struct ActionMachine {
    timings: ActionTimings,
    tasks: TaskSet,
}

impl ActionMachine {
    /// Create a machine with no active tasks.
    pub const fn new(timings: ActionTimings) -> Self {
        Self {
            timings,
            tasks: TaskSet::new(),
        }
    }

    /// The timings this machine runs with.
    pub const fn timings(&self) -> &ActionTimings {
        &self.timings
    }

    /// The active tasks.
    pub const fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    // -------------------------------------------------------------------
    // Decisions
    // -------------------------------------------------------------------

    /// Start executing `decision` for agent `id`.
    ///
    /// # Errors
    ///
    /// [`ActionError::MalformedDecision`] when a required field is missing
    /// or invalid; [`ActionError::Agent`] for an unknown agent. Neither
    /// changes any state.
    pub fn apply(
        &mut self,
        agents: &mut AgentRegistry,
        id: &AgentId,
        decision: &Decision,
        now: Duration,
    ) -> Result<Vec<ActionEvent>, ActionError> {
        let planned = self.validate(agents, id, decision)?;
        let mut events = Vec::new();

        if self.interrupt(agents, id, now)? {
            debug!(agent_id = %id, "decision replaces a running action");
        }

        match planned {
            Planned::Move { goal, to } => {
                let from = agents.require(id)?.position;
                let plan = MovementPlan::new(from, to, self.timings.speed, now);
                if from.within(&plan.to, self.timings.arrival_epsilon) {
                    agents.require_mut(id)?.idle_since = now;
                    debug!(agent_id = %id, "already at move target");
                    events.push(ActionEvent::Completed {
                        agent_id: id.clone(),
                        action: CompletedAction::Move,
                    });
                } else {
                    agents.update(id, AgentUpdate::new().action(AgentAction::Moving { goal }), now)?;
                    self.tasks.schedule(id.clone(), TaskKind::Movement(plan));
                    events.push(ActionEvent::Updated(id.clone()));
                }
            }
            Planned::Text {
                recipient,
                utterance,
            } => {
                // Delivery failures are logged by the messaging layer; the
                // agent still speaks.
                if let Ok(to) = messaging::send_text(agents, id, &recipient, &utterance) {
                    events.push(ActionEvent::TextDelivered {
                        from: id.clone(),
                        to,
                    });
                }
                let ends_at = now.saturating_add(self.timings.speech_display);
                agents.update(
                    id,
                    AgentUpdate::new()
                        .action(AgentAction::Speaking)
                        .say(utterance, ends_at),
                    now,
                )?;
                self.tasks.schedule(id.clone(), TaskKind::Speech { ends_at });
                events.insert(0, ActionEvent::Updated(id.clone()));
            }
            Planned::Rest => {
                let ends_at = now.saturating_add(self.timings.rest_duration);
                agents.update(id, AgentUpdate::new().action(AgentAction::Resting), now)?;
                self.tasks.schedule(id.clone(), TaskKind::Rest { ends_at });
                events.push(ActionEvent::Updated(id.clone()));
            }
            Planned::Observe => events.push(ActionEvent::Observed(id.clone())),
        }

        info!(agent_id = %id, decision = %decision.summary(), "decision applied");
        Ok(events)
    }

    fn validate(
        &self,
        agents: &AgentRegistry,
        id: &AgentId,
        decision: &Decision,
    ) -> Result<Planned, ActionError> {
        let me = agents.require(id)?;
        match decision.action {
            DecisionAction::Move => match &decision.target {
                Some(DecisionTarget::Point { x, z }) => {
                    if !x.is_finite() || !z.is_finite() {
                        return Err(ActionError::malformed("move target is not finite"));
                    }
                    let (x, z) = (self.clamp(*x), self.clamp(*z));
                    Ok(Planned::Move {
                        goal: GoalTarget::Point { x, z },
                        to: Position::new(x, me.position.y, z),
                    })
                }
                Some(DecisionTarget::Agent { agent }) => {
                    let Some(other) = agents.find_by_name(agent) else {
                        return Err(ActionError::malformed(format!(
                            "move target agent {agent} does not exist"
                        )));
                    };
                    if other.id == me.id {
                        return Err(ActionError::malformed("move target is the agent itself"));
                    }
                    Ok(Planned::Move {
                        goal: GoalTarget::Agent {
                            id: other.id.clone(),
                            name: other.name.clone(),
                        },
                        to: Position::new(
                            self.clamp(other.position.x),
                            me.position.y,
                            self.clamp(other.position.z),
                        ),
                    })
                }
                None => Err(ActionError::malformed("move without target")),
            },
            DecisionAction::Text => {
                let Some(DecisionTarget::Agent { agent }) = &decision.target else {
                    return Err(ActionError::malformed("text without recipient agent"));
                };
                let Some(utterance) = decision
                    .utterance
                    .as_deref()
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                else {
                    return Err(ActionError::malformed("text without utterance"));
                };
                if *agent == me.name {
                    return Err(ActionError::malformed("text addressed to self"));
                }
                Ok(Planned::Text {
                    recipient: agent.clone(),
                    utterance: utterance.to_owned(),
                })
            }
            DecisionAction::Idle => Ok(Planned::Rest),
            DecisionAction::Observe => Ok(Planned::Observe),
        }
    }

    fn clamp(&self, v: f64) -> f64 {
        v.clamp(-self.timings.bounds, self.timings.bounds)
    }

    // -------------------------------------------------------------------
    // Time
    // -------------------------------------------------------------------

    /// Advance every active task to `now`.
    pub fn advance(&mut self, agents: &mut AgentRegistry, now: Duration) -> Vec<ActionEvent> {
        let mut events = Vec::new();
        for id in agents.ids().to_vec() {
            let Some(task) = self.tasks.get(&id).copied() else {
                continue;
            };
            let (update, completed) = match task {
                TaskKind::Movement(plan) if plan.arrived(now) => (
                    AgentUpdate::new()
                        .position(plan.to)
                        .action(AgentAction::Idle),
                    Some(CompletedAction::Move),
                ),
                TaskKind::Movement(plan) => {
                    (AgentUpdate::new().position(plan.position_at(now)), None)
                }
                TaskKind::Speech { ends_at } if now >= ends_at => (
                    AgentUpdate::new().action(AgentAction::Idle).silence(),
                    Some(CompletedAction::Text),
                ),
                TaskKind::Rest { ends_at } if now >= ends_at => (
                    AgentUpdate::new().action(AgentAction::Idle),
                    Some(CompletedAction::Idle),
                ),
                TaskKind::Speech { .. } | TaskKind::Rest { .. } => continue,
            };

            if completed.is_some() {
                self.tasks.cancel(&id);
            }
            if let Err(err) = agents.update(&id, update, now) {
                warn!(agent_id = %id, error = %err, "dropping task of missing agent");
                self.tasks.cancel(&id);
                continue;
            }
            events.push(ActionEvent::Updated(id.clone()));
            if let Some(action) = completed {
                debug!(agent_id = %id, ?action, "action completed");
                events.push(ActionEvent::Completed {
                    agent_id: id,
                    action,
                });
            }
        }
        events
    }

    // -------------------------------------------------------------------
    // Interruption and cancellation
    // -------------------------------------------------------------------

    /// Drop the agent back to `Idle` where it stands. No completion is
    /// reported. Returns `false` if the agent was already idle.
    pub fn interrupt(
        &mut self,
        agents: &mut AgentRegistry,
        id: &AgentId,
        now: Duration,
    ) -> Result<bool, AgentError> {
        let agent = agents.require(id)?;
        let cancelled = self.tasks.cancel(id);
        if agent.action.is_idle() {
            return Ok(false);
        }
        let position = match cancelled {
            Some(TaskKind::Movement(plan)) => plan.position_at(now),
            _ => agent.position,
        };
        agents.update(
            id,
            AgentUpdate::new()
                .position(position)
                .action(AgentAction::Idle)
                .silence(),
            now,
        )?;
        debug!(agent_id = %id, "action interrupted");
        Ok(true)
    }

    /// Interrupt every agent. Used when the simulation starts.
    pub fn idle_all(&mut self, agents: &mut AgentRegistry, now: Duration) -> Vec<ActionEvent> {
        let mut events = Vec::new();
        for id in agents.ids().to_vec() {
            if let Ok(true) = self.interrupt(agents, &id, now) {
                events.push(ActionEvent::Updated(id));
            }
        }
        events
    }

    /// Cancel every scheduled task without touching agent state.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.cancel_all();
        if n > 0 {
            debug!(cancelled = n, "scheduled tasks cancelled");
        }
        n
    }
}
