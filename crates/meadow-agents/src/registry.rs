//! The Agent Registry.
//!
//! [`AgentRegistry`] owns the canonical [`Agent`] records. Agents are
//! created from their configured [`AgentProfile`]s at world load, kept in
//! roster order (the order is the tie-break for contested coins), and
//! restored from the same profiles on reset. Nothing else holds agent
//! state; every other subsystem borrows the registry it is handed.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use meadow_types::{Agent, AgentAction, AgentId, AgentProfile, Position};
use tracing::warn;

use crate::error::AgentError;

/// A partial update applied with [`AgentRegistry::update`]. Fields left as
/// `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentUpdate {
    /// New position.
    pub position: Option<Position>,
    /// New action.
    pub action: Option<AgentAction>,
    /// New utterance; `Some(None)` clears it.
    pub utterance: Option<Option<String>>,
    /// New utterance expiry; `Some(None)` clears it.
    pub utterance_expires_at: Option<Option<Duration>>,
}

impl AgentUpdate {
    /// An empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the position.
    #[must_use]
    pub const fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the action.
    #[must_use]
    pub fn action(mut self, action: AgentAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Display `text` until `expires_at`.
    #[must_use]
    pub fn say(mut self, text: String, expires_at: Duration) -> Self {
        self.utterance = Some(Some(text));
        self.utterance_expires_at = Some(Some(expires_at));
        self
    }

    /// Clear any displayed utterance.
    #[must_use]
    pub fn silence(mut self) -> Self {
        self.utterance = Some(None);
        self.utterance_expires_at = Some(None);
        self
    }
}

/// Insertion-ordered store of every agent in the simulation.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    /// Roster order.
    order: Vec<AgentId>,
    /// Agent records by id.
    agents: BTreeMap<AgentId, Agent>,
    /// Initial configuration, used for reset.
    profiles: Vec<AgentProfile>,
}

impl AgentRegistry {
    /// Create a registry from the configured roster.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateId`] or [`AgentError::DuplicateName`]
    /// if two profiles collide.
    pub fn new(profiles: Vec<AgentProfile>) -> Result<Self, AgentError> {
        let mut names = BTreeSet::new();
        let mut order = Vec::with_capacity(profiles.len());
        let mut agents = BTreeMap::new();
        for profile in &profiles {
            if agents.contains_key(&profile.id) {
                return Err(AgentError::DuplicateId(profile.id.clone()));
            }
            if !names.insert(profile.name.as_str()) {
                return Err(AgentError::DuplicateName(profile.name.clone()));
            }
            order.push(profile.id.clone());
            agents.insert(profile.id.clone(), Agent::from_profile(profile));
        }
        Ok(Self {
            order,
            agents,
            profiles,
        })
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Look up an agent.
    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Look up an agent, logging and failing when it does not exist.
    pub fn require(&self, id: &AgentId) -> Result<&Agent, AgentError> {
        self.agents.get(id).ok_or_else(|| {
            warn!(agent_id = %id, "unknown agent");
            AgentError::AgentNotFound(id.clone())
        })
    }

    /// Mutable lookup, logging and failing when the agent does not exist.
    pub fn require_mut(&mut self, id: &AgentId) -> Result<&mut Agent, AgentError> {
        self.agents.get_mut(id).ok_or_else(|| {
            warn!(agent_id = %id, "unknown agent");
            AgentError::AgentNotFound(id.clone())
        })
    }

    /// Find an agent by its display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Agent> {
        self.all().find(|a| a.name == name)
    }

    /// Every agent in roster order.
    pub fn all(&self) -> impl Iterator<Item = &Agent> {
        self.order.iter().filter_map(|id| self.agents.get(id))
    }

    /// Agent ids in roster order.
    pub fn ids(&self) -> &[AgentId] {
        &self.order
    }

    /// The configured roster.
    pub fn profiles(&self) -> &[AgentProfile] {
        &self.profiles
    }

    /// Configured profile for one agent.
    pub fn profile(&self, id: &AgentId) -> Option<&AgentProfile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Apply a partial update. Entering `Idle` records `now` as the
    /// agent's idle-since time.
    pub fn update(
        &mut self,
        id: &AgentId,
        update: AgentUpdate,
        now: Duration,
    ) -> Result<&Agent, AgentError> {
        let agent = self.require_mut(id)?;
        if let Some(position) = update.position {
            agent.position = position;
        }
        if let Some(action) = update.action {
            if action.is_idle() && !agent.action.is_idle() {
                agent.idle_since = now;
            }
            agent.action = action;
        }
        if let Some(utterance) = update.utterance {
            agent.utterance = utterance;
        }
        if let Some(expiry) = update.utterance_expires_at {
            agent.utterance_expires_at = expiry;
        }
        Ok(agent)
    }

    /// Restore every agent to its configured initial state.
    pub fn reset_to_initial(&mut self) {
        for profile in &self.profiles {
            self.agents
                .insert(profile.id.clone(), Agent::from_profile(profile));
        }
    }

    /// Clear every agent's in-flight decision mark. Returns how many
    /// agents had one.
    pub fn release_pending_decisions(&mut self) -> usize {
        self.agents
            .values_mut()
            .filter_map(|agent| agent.pending_decision.take())
            .count()
    }
}
