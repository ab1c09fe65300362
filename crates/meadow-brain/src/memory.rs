//! Bounded per-agent memory for the LLM oracle.
//!
//! Each agent remembers its most recent decisions and its most recent
//! observations, `limit` of each. Both are rendered into the next prompt.
//! The whole store is wiped when the simulation is reset.
//!
//! Every wipe starts a new generation. Writers pass the generation they
//! read before their model call, and writes from an older generation are
//! dropped, so a call still running across a reset cannot leak pre-reset
//! history into the cleared store.

use std::collections::{HashMap, VecDeque};

use meadow_types::AgentId;
use serde::Serialize;
use tokio::sync::Mutex;

/// One remembered decision or observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryEntry {
    /// Simulation time in whole seconds.
    pub time_s: u64,
    /// What happened, as rendered into the prompt.
    pub summary: String,
}

/// What one agent remembers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentMemory {
    /// Past decisions, oldest first.
    pub decisions: VecDeque<MemoryEntry>,
    /// Past observations, oldest first.
    pub observations: VecDeque<MemoryEntry>,
}

impl AgentMemory {
    /// Whether nothing has been remembered yet.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty() && self.observations.is_empty()
    }
}

#[derive(Debug, Default)]
struct Generations {
    current: u64,
    agents: HashMap<AgentId, AgentMemory>,
}

/// Memory for every agent, shared across concurrent decision tasks.
#[derive(Debug)]
pub struct MemoryStore {
    limit: usize,
    inner: Mutex<Generations>,
}

impl MemoryStore {
    /// A store keeping at most `limit` entries of each kind per agent.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            inner: Mutex::new(Generations::default()),
        }
    }

    /// The current generation. Bumped by every [`clear`](Self::clear).
    pub async fn generation(&self) -> u64 {
        self.inner.lock().await.current
    }

    /// A copy of what `agent` currently remembers.
    pub async fn recall(&self, agent: &AgentId) -> AgentMemory {
        self.inner
            .lock()
            .await
            .agents
            .get(agent)
            .cloned()
            .unwrap_or_default()
    }

    /// Remember a decision made by `agent` during `generation`.
    ///
    /// Returns `false`, writing nothing, if the store was cleared since.
    pub async fn remember_decision(
        &self,
        agent: &AgentId,
        generation: u64,
        entry: MemoryEntry,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.current != generation {
            return false;
        }
        let memory = inner.agents.entry(agent.clone()).or_default();
        push_bounded(&mut memory.decisions, entry, self.limit);
        true
    }

    /// Remember what `agent` saw during `generation`.
    ///
    /// Returns `false`, writing nothing, if the store was cleared since.
    pub async fn remember_observation(
        &self,
        agent: &AgentId,
        generation: u64,
        entry: MemoryEntry,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.current != generation {
            return false;
        }
        let memory = inner.agents.entry(agent.clone()).or_default();
        push_bounded(&mut memory.observations, entry, self.limit);
        true
    }

    /// Forget everything and start a new generation.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.agents.clear();
        inner.current = inner.current.wrapping_add(1);
    }
}

fn push_bounded(entries: &mut VecDeque<MemoryEntry>, entry: MemoryEntry, limit: usize) {
    entries.push_back(entry);
    while entries.len() > limit {
        entries.pop_front();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(time_s: u64) -> MemoryEntry {
        MemoryEntry {
            time_s,
            summary: format!("event at {time_s}"),
        }
    }

    #[tokio::test]
    async fn oldest_entries_are_evicted() {
        let store = MemoryStore::new(2);
        let alice = AgentId::new("agent1");
        for t in 0..5 {
            assert!(store.remember_decision(&alice, 0, entry(t)).await);
        }
        let memory = store.recall(&alice).await;
        let times: Vec<u64> = memory.decisions.iter().map(|e| e.time_s).collect();
        assert_eq!(times, vec![3, 4]);
        assert!(memory.observations.is_empty());
    }

    #[tokio::test]
    async fn agents_do_not_share_memory() {
        let store = MemoryStore::new(10);
        store
            .remember_observation(&AgentId::new("agent1"), 0, entry(1))
            .await;
        assert!(store.recall(&AgentId::new("agent2")).await.is_empty());
        assert_eq!(
            store.recall(&AgentId::new("agent1")).await.observations.len(),
            1
        );
    }

    #[tokio::test]
    async fn clear_forgets_everything() {
        let store = MemoryStore::new(10);
        let alice = AgentId::new("agent1");
        store.remember_decision(&alice, 0, entry(1)).await;
        store.remember_observation(&alice, 0, entry(1)).await;
        store.clear().await;
        assert!(store.recall(&alice).await.is_empty());
        assert_eq!(store.generation().await, 1);
    }

    #[tokio::test]
    async fn writes_from_before_a_clear_are_dropped() {
        let store = MemoryStore::new(10);
        let alice = AgentId::new("agent1");
        let before = store.generation().await;
        store.clear().await;

        assert!(!store.remember_decision(&alice, before, entry(1)).await);
        assert!(!store.remember_observation(&alice, before, entry(1)).await);
        assert!(store.recall(&alice).await.is_empty());

        let after = store.generation().await;
        assert!(store.remember_decision(&alice, after, entry(2)).await);
        assert_eq!(store.recall(&alice).await.decisions.len(), 1);
    }

    #[tokio::test]
    async fn zero_limit_keeps_nothing() {
        let store = MemoryStore::new(0);
        let alice = AgentId::new("agent1");
        store.remember_decision(&alice, 0, entry(1)).await;
        assert!(store.recall(&alice).await.is_empty());
    }
}
