//! Weapon profiles
//!
//! A profile is immutable once loaded into the armory. Combatants hold a
//! `WeaponId` binding; picking up a new weapon swaps the binding, never the
//! profile contents.

use serde::{Deserialize, Serialize};

use crate::combat::constants::*;
use crate::combat::math::DamagePacket;

/// Swing (blade + blunt) or thrust (pierce)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    Swing,
    Thrust,
}

/// Static stats of one weapon type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponProfile {
    pub name: String,
    /// Reach in world units
    pub attack_range: f32,
    pub blade_modifier: f32,
    pub blunt_modifier: f32,
    pub pierce_modifier: f32,
    pub quality: f32,
    pub condition: f32,
    /// Seconds from attack decision until damage lands
    pub damage_delay: f32,
    /// Seconds of the damage delay used by this weapon's block animation
    pub block_delay: f32,
    /// Pause between attack animations
    pub time_between_cycles: f32,
    /// Length of the swing animation at normal speed
    pub swing_seconds: f32,
}

impl Default for WeaponProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            attack_range: DEFAULT_ATTACK_RANGE,
            blade_modifier: DEFAULT_DAMAGE_MODIFIER,
            blunt_modifier: DEFAULT_DAMAGE_MODIFIER,
            pierce_modifier: DEFAULT_DAMAGE_MODIFIER,
            quality: DEFAULT_WEAPON_QUALITY,
            condition: DEFAULT_WEAPON_CONDITION,
            damage_delay: DEFAULT_DAMAGE_DELAY,
            block_delay: DEFAULT_BLOCK_DELAY,
            time_between_cycles: DEFAULT_CYCLE_SECONDS,
            swing_seconds: DEFAULT_SWING_SECONDS,
        }
    }
}

impl WeaponProfile {
    fn wear(&self) -> f32 {
        self.quality * self.condition
    }

    pub fn effective_blade(&self) -> f32 {
        self.blade_modifier * self.wear()
    }

    pub fn effective_blunt(&self) -> f32 {
        self.blunt_modifier * self.wear()
    }

    pub fn effective_pierce(&self) -> f32 {
        self.pierce_modifier * self.wear()
    }

    /// Probability of a swing rather than a thrust
    ///
    /// Driven by whichever of blade/blunt is stronger against pierce. A
    /// weapon with no modifiers at all always swings.
    pub fn swing_chance(&self) -> f32 {
        let swing = self.blade_modifier.max(self.blunt_modifier);
        let total = swing + self.pierce_modifier;
        if total <= f32::EPSILON {
            1.0
        } else {
            swing / total
        }
    }

    /// Raw damage for one attack of the given kind
    pub fn raw_damage(&self, kind: AttackKind, base_damage: f32) -> DamagePacket {
        match kind {
            AttackKind::Swing => DamagePacket::new(
                base_damage * self.effective_blade(),
                base_damage * self.effective_blunt(),
                0.0,
            ),
            AttackKind::Thrust => DamagePacket::new(0.0, 0.0, base_damage * self.effective_pierce()),
        }
    }

    /// Wait between two attack cycles, before jitter is applied to the cadence
    pub fn cycle_seconds(&self, animation_speed: f32, cadence_factor: f32) -> f32 {
        let speed = if animation_speed > f32::EPSILON { animation_speed } else { 1.0 };
        self.swing_seconds / speed + self.time_between_cycles * cadence_factor
    }

    /// Delay before block feedback for a defender holding this weapon
    pub fn block_feedback_delay(&self, incoming_damage_delay: f32) -> f32 {
        (incoming_damage_delay - self.block_delay).max(0.0)
    }
}
