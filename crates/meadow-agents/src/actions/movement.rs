//! Constant-speed straight-line movement.

use std::time::Duration;

use meadow_types::Position;

/// A planned walk from one point to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementPlan {
    /// Where the walk started.
    pub from: Position,
    /// Where the walk ends. Height is taken from `from`.
    pub to: Position,
    /// Simulation time the walk started.
    pub started_at: Duration,
    /// How long the walk takes.
    pub duration: Duration,
}

impl MovementPlan {
    /// Plan a walk at `speed` units per second. A zero-length or
    /// non-finite walk gets a zero duration.
    pub fn new(from: Position, to: Position, speed: f64, started_at: Duration) -> Self {
        let to = Position::new(to.x, from.y, to.z);
        let seconds = from.planar_distance(&to) / speed;
        Self {
            from,
            to,
            started_at,
            duration: Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO),
        }
    }

    /// Simulation time at which the walk ends.
    pub fn arrives_at(&self) -> Duration {
        self.started_at.saturating_add(self.duration)
    }

    /// Whether the walk is over at `now`.
    pub fn arrived(&self, now: Duration) -> bool {
        now >= self.arrives_at()
    }

    /// Interpolated position at `now`.
    pub fn position_at(&self, now: Duration) -> Position {
        if self.duration.is_zero() || self.arrived(now) {
            return self.to;
        }
        let elapsed = now.saturating_sub(self.started_at);
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from.lerp_planar(&self.to, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn four_units_at_two_per_second_takes_two_seconds() {
        let plan = MovementPlan::new(
            Position::new(0.0, 0.6, 0.0),
            Position::new(4.0, 0.0, 0.0),
            2.0,
            Duration::from_secs(1),
        );
        assert_eq!(plan.duration, Duration::from_secs(2));
        assert_eq!(plan.arrives_at(), Duration::from_secs(3));

        let half = plan.position_at(Duration::from_secs(2));
        assert!((half.x - 2.0).abs() < EPS);
        assert!((half.y - 0.6).abs() < EPS);

        let end = plan.position_at(Duration::from_secs(10));
        assert!((end.x - 4.0).abs() < EPS);
    }

    #[test]
    fn zero_length_walk_arrives_immediately() {
        let p = Position::new(1.0, 0.6, 1.0);
        let plan = MovementPlan::new(p, p, 2.0, Duration::ZERO);
        assert!(plan.arrived(Duration::ZERO));
    }
}
