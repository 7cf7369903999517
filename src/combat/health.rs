//! Health tracking with a one-shot death transition
//!
//! Sign convention: positive deltas are damage, negative deltas are healing.

use serde::{Deserialize, Serialize};

/// Result of a single health adjustment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthChange {
    pub previous: f32,
    pub current: f32,
    /// True exactly once: on the damage that takes a living tracker to zero
    pub died: bool,
}

impl HealthChange {
    pub fn amount_lost(&self) -> f32 {
        self.previous - self.current
    }
}

/// Current and maximum health of one combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthTracker {
    current: f32,
    max: f32,
}

impl HealthTracker {
    /// Full health tracker; a non-positive max is raised to a minimal pool
    pub fn new(max: f32) -> Self {
        let max = if max > f32::EPSILON { max } else { 1.0 };
        Self { current: max, max }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_alive(&self) -> bool {
        self.current > f32::EPSILON
    }

    /// Health as a fraction of max, in [0, 1]
    pub fn percent(&self) -> f32 {
        self.current / self.max
    }

    /// Apply damage (positive) or healing (negative), clamped to [0, max]
    pub fn adjust(&mut self, delta: f32) -> HealthChange {
        let previous = self.current;
        let was_alive = self.is_alive();
        if !delta.is_nan() {
            self.current = (self.current - delta).clamp(0.0, self.max);
        }
        HealthChange {
            previous,
            current: self.current,
            died: was_alive && delta > 0.0 && !self.is_alive(),
        }
    }

    /// Adjust by a fraction of remaining health, or of missing health
    ///
    /// With `use_remaining` the delta is `-current * fraction`, otherwise
    /// `-(max - current) * fraction`; a positive fraction therefore heals in
    /// proportion to what the combatant has lost.
    pub fn adjust_percent(&mut self, fraction: f32, use_remaining: bool) -> HealthChange {
        let delta = if use_remaining {
            -self.current * fraction
        } else {
            -(self.max - self.current) * fraction
        };
        self.adjust(delta)
    }
}
