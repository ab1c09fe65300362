//! World event observers.
//!
//! The simulation reports every externally visible state change as a
//! [`WorldEvent`] to a single [`WorldObserver`]. A render bridge, a log
//! sink, or a test recorder plugs in here.

use std::sync::{Arc, Mutex, PoisonError};

use meadow_types::WorldEvent;

/// Receives world events as they happen.
pub trait WorldObserver: Send {
    /// Called once per event, in emission order.
    fn on_event(&mut self, event: &WorldEvent);
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl WorldObserver for NoOpObserver {
    fn on_event(&mut self, _event: &WorldEvent) {}
}

/// Records events into a shared buffer.
///
/// Clones share the buffer, so a test can keep one handle and give the
/// other to the simulation.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<WorldEvent>>>,
}

impl RecordingObserver {
    /// An observer with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event recorded so far.
    pub fn events(&self) -> Vec<WorldEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discard recorded events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl WorldObserver for RecordingObserver {
    fn on_event(&mut self, event: &WorldEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
