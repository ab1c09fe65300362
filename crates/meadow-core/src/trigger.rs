//! Interest triggers and the dispatcher queue.
//!
//! Every subsystem that wants an agent to reconsider what it is doing
//! pushes a [`Trigger`] into the [`TriggerQueue`] owned by the
//! [`Simulation`](crate::simulation::Simulation). The simulation drains the
//! queue and routes each trigger to the decision broker.

use std::collections::VecDeque;

use meadow_types::{AgentId, CompletedAction, ObjectId};

/// Why an agent should be asked for a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// The simulation just started.
    Initial,
    /// Agents came within the observation radius.
    NewAgents(Vec<AgentId>),
    /// Agents went out of the observation radius.
    AgentsLeft(Vec<AgentId>),
    /// Objects came within the observation radius.
    NewObjects(Vec<ObjectId>),
    /// Objects went out of range or were collected.
    ObjectsLeft(Vec<ObjectId>),
    /// The agent finished an action.
    ActionCompletion(CompletedAction),
    /// A text message arrived in the agent's inbox.
    ReceivedText {
        /// The sender.
        from: AgentId,
    },
    /// Every coin in the world has been collected.
    AllCoinsCollected,
    /// The agent sat idle past the stuck threshold.
    Watchdog,
    /// An operator asked for a decision directly.
    Forced,
}

impl Trigger {
    /// Whether the trigger drops a busy agent back to `Idle`. Other
    /// triggers are honored only while the agent is already idle.
    pub const fn interrupts(&self) -> bool {
        matches!(
            self,
            Self::NewObjects(_) | Self::ObjectsLeft(_) | Self::ReceivedText { .. }
        )
    }

    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::NewAgents(_) => "new_agents",
            Self::AgentsLeft(_) => "agents_left",
            Self::NewObjects(_) => "new_objects",
            Self::ObjectsLeft(_) => "objects_left",
            Self::ActionCompletion(_) => "action_completion",
            Self::ReceivedText { .. } => "received_text",
            Self::AllCoinsCollected => "all_coins_collected",
            Self::Watchdog => "watchdog",
            Self::Forced => "forced",
        }
    }
}

/// FIFO of pending triggers, each addressed to one agent.
#[derive(Debug, Clone, Default)]
pub struct TriggerQueue {
    queue: VecDeque<(AgentId, Trigger)>,
}

impl TriggerQueue {
    /// An empty queue.
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Queue a trigger for `agent`.
    pub fn push(&mut self, agent: AgentId, trigger: Trigger) {
        self.queue.push_back((agent, trigger));
    }

    /// Take the oldest pending trigger.
    pub fn pop(&mut self) -> Option<(AgentId, Trigger)> {
        self.queue.pop_front()
    }

    /// Drop every pending trigger.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Number of pending triggers.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_object_and_text_triggers_interrupt() {
        assert!(Trigger::NewObjects(Vec::new()).interrupts());
        assert!(Trigger::ObjectsLeft(Vec::new()).interrupts());
        assert!(Trigger::ReceivedText {
            from: AgentId::new("a")
        }
        .interrupts());
        assert!(!Trigger::NewAgents(Vec::new()).interrupts());
        assert!(!Trigger::AgentsLeft(Vec::new()).interrupts());
        assert!(!Trigger::Watchdog.interrupts());
        assert!(!Trigger::ActionCompletion(CompletedAction::Move).interrupts());
    }

    #[test]
    fn queue_is_fifo() {
        let mut q = TriggerQueue::new();
        q.push(AgentId::new("a"), Trigger::Initial);
        q.push(AgentId::new("b"), Trigger::Watchdog);
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop().map(|(id, _)| id), Some(AgentId::new("a")));
        q.clear();
        assert!(q.is_empty());
    }
}
