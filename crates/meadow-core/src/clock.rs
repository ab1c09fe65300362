//! Simulation clock.
//!
//! The clock is the single source of truth for "now" inside the scheduler.
//! Simulation time is the monotonic time elapsed since the clock was
//! created; every timer, watchdog threshold, and snapshot timestamp is
//! expressed as a [`Duration`] on this axis. The clock reads
//! [`tokio::time::Instant`], so paused-time tests drive it
//! deterministically.
//!
//! The clock also counts completed observation cycles with checked
//! arithmetic.

use std::time::Duration;

use tokio::time::Instant;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Cycle counter would overflow.
    #[error("observation cycle counter overflow: cannot advance beyond u64::MAX")]
    CycleOverflow,
}

/// Monotonic simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationClock {
    /// Real instant that corresponds to simulation time zero.
    origin: Instant,

    /// Observation cycles completed so far.
    cycles: u64,
}

impl SimulationClock {
    /// Start a clock at the current instant.
    pub fn start() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Start a clock whose zero is `origin`.
    pub const fn starting_at(origin: Instant) -> Self {
        Self { origin, cycles: 0 }
    }

    /// Simulation time now.
    pub fn now(&self) -> Duration {
        self.at(Instant::now())
    }

    /// Simulation time at `instant`. Instants before the origin map to zero.
    pub fn at(&self, instant: Instant) -> Duration {
        instant.saturating_duration_since(self.origin)
    }

    /// Count one completed observation cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::CycleOverflow`] if the counter is exhausted.
    pub fn record_cycle(&mut self) -> Result<u64, ClockError> {
        self.cycles = self
            .cycles
            .checked_add(1)
            .ok_or(ClockError::CycleOverflow)?;
        Ok(self.cycles)
    }

    /// Observation cycles completed so far.
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }
}
