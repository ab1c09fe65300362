//! World observer that writes every event to the log.
//!
//! Stands in for a render bridge: each [`WorldEvent`] is logged with its
//! JSON form, so a log shipper (or `RUST_LOG=meadow_engine=trace` and a
//! pipe) can replay the simulation visually. Per-frame agent updates go
//! to `trace`; everything else goes to `debug` or `info`.

use meadow_core::observer::WorldObserver;
use meadow_types::WorldEvent;
use tracing::{debug, info, trace};

/// Logs world events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver {
    events: u64,
}

impl TracingObserver {
    /// A fresh observer.
    pub const fn new() -> Self {
        Self { events: 0 }
    }

    /// Events seen so far.
    pub const fn events(&self) -> u64 {
        self.events
    }
}

impl WorldObserver for TracingObserver {
    fn on_event(&mut self, event: &WorldEvent) {
        self.events = self.events.saturating_add(1);
        let json = serde_json::to_string(event).unwrap_or_default();

        match event {
            WorldEvent::AgentUpdated { agent_id, .. } => {
                trace!(agent_id = %agent_id, event = %json, "agent updated");
            }
            WorldEvent::ObjectCollected {
                object_id,
                collected_by,
            } => {
                info!(object_id = %object_id, collected_by = %collected_by, "coin collected");
            }
            WorldEvent::ObjectsGenerated { objects } => {
                debug!(objects = objects.len(), event = %json, "world objects generated");
            }
            WorldEvent::ActionCompleted { agent_id, action } => {
                debug!(agent_id = %agent_id, action = ?action, "action completed");
            }
            WorldEvent::AllCoinsCollected
            | WorldEvent::SimulationStarted
            | WorldEvent::SimulationStopped
            | WorldEvent::SimulationReset => {
                debug!(event = %json, "world event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use meadow_types::{AgentId, CompletedAction};

    use super::*;

    #[test]
    fn counts_every_event() {
        let mut observer = TracingObserver::new();
        observer.on_event(&WorldEvent::SimulationStarted);
        observer.on_event(&WorldEvent::ActionCompleted {
            agent_id: AgentId::new("agent1"),
            action: CompletedAction::Move,
        });
        observer.on_event(&WorldEvent::SimulationStopped);
        assert_eq!(observer.events(), 3);
    }
}
