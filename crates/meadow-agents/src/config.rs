//! Tunables for the action state machine.
//!
//! The core constructs an [`ActionTimings`] from the `movement` and
//! `timing` sections of `meadow-config.yaml` and hands it to the
//! [`ActionMachine`](crate::actions::ActionMachine).

use std::time::Duration;

/// Speeds, windows, and limits applied while executing actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionTimings {
    /// Walking speed in world units per second (default: 2.0).
    pub speed: f64,

    /// Distance under which a move counts as already arrived (default: 0.05).
    pub arrival_epsilon: f64,

    /// How long an utterance stays displayed (default: 2.5 s).
    pub speech_display: Duration,

    /// How long a rest lasts (default: 5 s).
    pub rest_duration: Duration,

    /// Half-extent of the square move targets are clamped into (default: 4.0).
    pub bounds: f64,
}

impl Default for ActionTimings {
    fn default() -> Self {
        Self {
            speed: 2.0,
            arrival_epsilon: 0.05,
            speech_display: Duration::from_millis(2500),
            rest_duration: Duration::from_secs(5),
            bounds: 4.0,
        }
    }
}
