//! Global combat configuration loaded from TOML
//!
//! Every field has a default, so a partial file (or an empty one) is valid.
//! The values are read once at startup and never mutated afterwards.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ai::fear::FearSelection;
use crate::core::error::{Result, SkirmishError};

/// Defender-side tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseTuning {
    /// Fraction of block bonus lost when attacked from the flank (45-135 degrees)
    pub side_defence_penalty: f32,
    /// Fraction of block bonus lost when attacked from behind (over 135 degrees)
    pub rear_defence_penalty: f32,
    /// How long a defender stays latched in its block after the block feedback
    pub block_recovery_seconds: f32,
    /// Flat absorption added to every damage type when the player is hit
    ///
    /// Zero by default; some builds used +20 as a balancing aid.
    pub player_armor_bonus: f32,
}

impl Default for DefenseTuning {
    fn default() -> Self {
        Self {
            side_defence_penalty: 0.3,
            rear_defence_penalty: 0.5,
            block_recovery_seconds: 0.5,
            player_armor_bonus: 0.0,
        }
    }
}

/// Attacker-side tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OffenseTuning {
    /// Slack added to weapon range before an attack loop is considered out of reach
    pub attack_range_tolerance: f32,
    /// Cadence is scaled by a uniform factor in [1 - jitter, 1 + jitter]
    pub cadence_jitter: f32,
}

impl Default for OffenseTuning {
    fn default() -> Self {
        Self {
            attack_range_tolerance: 0.5,
            cadence_jitter: 0.2,
        }
    }
}

/// AI director tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Pause between a flee order and the first move towards the safe point
    pub flee_start_delay: f32,
    /// Flee duration used by formation morale breaks
    pub formation_flee_seconds: f32,
    /// Minimum distance between the fleeing combatant and a fear destination
    pub fear_min_distance: f32,
    /// How fear destinations are picked when no escape route is found
    pub fear_selection: FearSelection,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            flee_start_delay: 0.5,
            formation_flee_seconds: 10.0,
            fear_min_distance: 25.0,
            fear_selection: FearSelection::PreferEscapeRoute,
        }
    }
}

/// Death and despawn timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleTuning {
    /// Delay between an AI combatant dying and being removed from the world
    pub death_vanish_seconds: f32,
}

impl Default for LifecycleTuning {
    fn default() -> Self {
        Self {
            death_vanish_seconds: 2.0,
        }
    }
}

/// Complete global combat configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatConfig {
    #[serde(default)]
    pub defense: DefenseTuning,
    #[serde(default)]
    pub offense: OffenseTuning,
    #[serde(default)]
    pub ai: AiTuning,
    #[serde(default)]
    pub lifecycle: LifecycleTuning,
}

impl CombatConfig {
    /// Parse and validate a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let fraction = |name: &str, value: f32| -> Result<()> {
            if !(0.0..=1.0).contains(&value) {
                return Err(SkirmishError::InvalidConfig(format!(
                    "{} ({}) must be within [0, 1]",
                    name, value
                )));
            }
            Ok(())
        };
        let non_negative = |name: &str, value: f32| -> Result<()> {
            if value.is_nan() || value < 0.0 {
                return Err(SkirmishError::InvalidConfig(format!(
                    "{} ({}) must not be negative",
                    name, value
                )));
            }
            Ok(())
        };

        fraction("side_defence_penalty", self.defense.side_defence_penalty)?;
        fraction("rear_defence_penalty", self.defense.rear_defence_penalty)?;
        non_negative("block_recovery_seconds", self.defense.block_recovery_seconds)?;
        non_negative("player_armor_bonus", self.defense.player_armor_bonus)?;
        non_negative("attack_range_tolerance", self.offense.attack_range_tolerance)?;
        non_negative("flee_start_delay", self.ai.flee_start_delay)?;
        non_negative("formation_flee_seconds", self.ai.formation_flee_seconds)?;
        non_negative("fear_min_distance", self.ai.fear_min_distance)?;
        non_negative("death_vanish_seconds", self.lifecycle.death_vanish_seconds)?;

        if !(0.0..1.0).contains(&self.offense.cadence_jitter) {
            return Err(SkirmishError::InvalidConfig(format!(
                "cadence_jitter ({}) must be within [0, 1)",
                self.offense.cadence_jitter
            )));
        }

        Ok(())
    }
}

/// Load the global combat config from a TOML file
///
/// A missing file is a setup error: the combat model has no sensible
/// behavior without its direction penalties.
pub fn load_combat_config(path: impl AsRef<Path>) -> Result<CombatConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SkirmishError::MissingCombatConfig(path.display().to_string()));
    }
    let contents = fs::read_to_string(path)?;
    let config = CombatConfig::from_toml_str(&contents)?;
    tracing::debug!(path = %path.display(), "loaded combat config");
    Ok(config)
}
