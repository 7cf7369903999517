//! Stamina pool gating special abilities

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaminaConfig {
    pub max: f32,
    /// Points recovered per second
    pub recovery_per_second: f32,
}

impl Default for StaminaConfig {
    fn default() -> Self {
        Self {
            max: 100.0,
            recovery_per_second: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaminaPool {
    current: f32,
    max: f32,
    recovery_per_second: f32,
}

impl StaminaPool {
    /// Starts full
    pub fn new(config: &StaminaConfig) -> Self {
        let max = config.max.max(0.0);
        Self {
            current: max,
            max,
            recovery_per_second: config.recovery_per_second.max(0.0),
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn percent(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    pub fn can_spend(&self, cost: f32) -> bool {
        cost <= self.current
    }

    /// Spend `cost` if affordable; nothing is taken otherwise
    pub fn try_spend(&mut self, cost: f32) -> bool {
        if !self.can_spend(cost) {
            return false;
        }
        self.current = (self.current - cost).clamp(0.0, self.max);
        true
    }

    pub fn recover(&mut self, dt: f32) {
        if self.current < self.max {
            self.current = (self.current + self.recovery_per_second * dt).clamp(0.0, self.max);
        }
    }
}
