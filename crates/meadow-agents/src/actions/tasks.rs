//! Scheduled per-agent tasks.
//!
//! Every timed action (a walk, a speech window, a rest) is one entry in
//! the [`TaskSet`]. An agent has at most one active task, and scheduling a
//! new one replaces it. Cancelling removes the entry, so a cancelled task
//! can never fire.

use std::collections::BTreeMap;
use std::time::Duration;

use meadow_types::AgentId;

use super::movement::MovementPlan;

/// What a task does when it is polled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskKind {
    /// Interpolate the agent's position each frame until arrival.
    Movement(MovementPlan),
    /// Clear the utterance at `ends_at`.
    Speech {
        /// When the display window closes.
        ends_at: Duration,
    },
    /// Return to `Idle` at `ends_at`.
    Rest {
        /// When the rest ends.
        ends_at: Duration,
    },
}

/// The active tasks of every agent.
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: BTreeMap<AgentId, TaskKind>,
}

impl TaskSet {
    /// An empty task set.
    pub const fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
        }
    }

    /// Schedule `kind` for `agent`. Returns the task it replaced, if any.
    pub fn schedule(&mut self, agent: AgentId, kind: TaskKind) -> Option<TaskKind> {
        self.tasks.insert(agent, kind)
    }

    /// The agent's active task, if any.
    pub fn get(&self, agent: &AgentId) -> Option<&TaskKind> {
        self.tasks.get(agent)
    }

    /// Cancel the agent's active task.
    pub fn cancel(&mut self, agent: &AgentId) -> Option<TaskKind> {
        self.tasks.remove(agent)
    }

    /// Cancel every task. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    /// Number of active tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is active.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
