//! Special abilities gated by a stamina pool
//!
//! Abilities are configured as data. The world carries out their effects;
//! this module owns stamina, limited-use counters and the refusal rules.

pub mod stamina;

use serde::{Deserialize, Serialize};

use crate::combat::event::AttackAdjustments;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::CombatantId;

pub use stamina::{StaminaConfig, StaminaPool};

/// Ability-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbilityKind {
    /// Heal a share of missing health; limited uses, refused near enemies
    FirstAid {
        heal_percent: f32,
        /// Enemies inside this radius block the heal; 0 disables the check
        safe_radius: f32,
        max_uses: u32,
    },
    /// Flat damage to everyone else within the radius
    AreaEffect { extra_damage: f32, radius: f32 },
    /// Hostile AI combatants in radius may flee, weighted by level difference
    BattleRoar { level: u32, radius: f32, duration: f32 },
    /// Single special attack that ignores some armor
    AimedShot {
        attack_adj: f32,
        damage_adj: f32,
        armor_avoid_adj: f32,
        recovery_seconds: f32,
    },
    /// Single special attack that is harder to block
    FeignedAttack {
        attack_adj: f32,
        damage_adj: f32,
        armor_avoid_adj: f32,
        recovery_seconds: f32,
    },
}

impl AbilityKind {
    pub fn first_aid() -> Self {
        AbilityKind::FirstAid { heal_percent: 0.6, safe_radius: 15.0, max_uses: 5 }
    }

    pub fn area_effect() -> Self {
        AbilityKind::AreaEffect { extra_damage: 10.0, radius: 15.0 }
    }

    pub fn battle_roar() -> Self {
        AbilityKind::BattleRoar { level: 5, radius: 8.0, duration: 5.0 }
    }

    pub fn aimed_shot() -> Self {
        AbilityKind::AimedShot {
            attack_adj: 0.0,
            damage_adj: 50.0,
            armor_avoid_adj: 0.3,
            recovery_seconds: 1.0,
        }
    }

    pub fn feigned_attack() -> Self {
        AbilityKind::FeignedAttack {
            attack_adj: 30.0,
            damage_adj: 50.0,
            armor_avoid_adj: -0.1,
            recovery_seconds: 1.0,
        }
    }

    /// Does this ability need a target combatant?
    pub fn needs_target(&self) -> bool {
        matches!(self, AbilityKind::AimedShot { .. } | AbilityKind::FeignedAttack { .. })
    }

    /// Attack adjustments and recovery for the special-attack abilities
    pub fn special_attack(&self) -> Option<(AttackAdjustments, f32)> {
        match *self {
            AbilityKind::AimedShot { attack_adj, damage_adj, armor_avoid_adj, recovery_seconds }
            | AbilityKind::FeignedAttack { attack_adj, damage_adj, armor_avoid_adj, recovery_seconds } => {
                Some((AttackAdjustments { attack_adj, damage_adj, armor_avoid_adj }, recovery_seconds))
            }
            _ => None,
        }
    }
}

/// One configured ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityConfig {
    pub name: String,
    #[serde(default = "default_stamina_cost")]
    pub stamina_cost: f32,
    pub kind: AbilityKind,
}

fn default_stamina_cost() -> f32 {
    20.0
}

impl AbilityConfig {
    pub fn new(name: impl Into<String>, kind: AbilityKind) -> Self {
        Self {
            name: name.into(),
            stamina_cost: default_stamina_cost(),
            kind,
        }
    }

    pub fn with_cost(mut self, stamina_cost: f32) -> Self {
        self.stamina_cost = stamina_cost;
        self
    }
}

/// A configured ability plus its runtime counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub config: AbilityConfig,
    uses_remaining: Option<u32>,
}

impl AbilitySlot {
    pub fn new(config: AbilityConfig) -> Self {
        let uses_remaining = match config.kind {
            AbilityKind::FirstAid { max_uses, .. } => Some(max_uses),
            _ => None,
        };
        Self { config, uses_remaining }
    }

    /// Remaining uses for limited abilities, `None` if unlimited
    pub fn uses_remaining(&self) -> Option<u32> {
        self.uses_remaining
    }

    pub fn has_uses(&self) -> bool {
        self.uses_remaining.map_or(true, |n| n > 0)
    }

    fn consume_use(&mut self) {
        if let Some(n) = self.uses_remaining.as_mut() {
            *n = n.saturating_sub(1);
        }
    }
}

/// Result of an ability attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityOutcome {
    Used,
    OutOfStamina,
    NoUsesRemaining,
    EnemiesTooClose,
    NoTarget,
    /// The user is dead
    Incapacitated,
}

/// A combatant's stamina and ability slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialAbilities {
    pub stamina: StaminaPool,
    slots: Vec<AbilitySlot>,
}

impl SpecialAbilities {
    pub fn new(stamina: &StaminaConfig, abilities: Vec<AbilityConfig>) -> Self {
        Self {
            stamina: StaminaPool::new(stamina),
            slots: abilities.into_iter().map(AbilitySlot::new).collect(),
        }
    }

    pub fn slot(&self, owner: CombatantId, index: usize) -> Result<&AbilitySlot> {
        self.slots
            .get(index)
            .ok_or(SkirmishError::AbilitySlotOutOfRange { combatant: owner, slot: index })
    }

    /// Check counters and stamina; on success both are consumed
    ///
    /// Ability-specific context checks (targets, nearby enemies) must already
    /// have passed: a refusal here leaves everything untouched.
    pub fn commit(&mut self, owner: CombatantId, index: usize) -> Result<AbilityOutcome> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SkirmishError::AbilitySlotOutOfRange { combatant: owner, slot: index })?;
        if !slot.has_uses() {
            return Ok(AbilityOutcome::NoUsesRemaining);
        }
        if !self.stamina.try_spend(slot.config.stamina_cost) {
            return Ok(AbilityOutcome::OutOfStamina);
        }
        slot.consume_use();
        Ok(AbilityOutcome::Used)
    }

    /// Restock a limited-use ability (herb pickups and the like)
    pub fn add_uses(&mut self, owner: CombatantId, index: usize, amount: u32) -> Result<Option<u32>> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SkirmishError::AbilitySlotOutOfRange { combatant: owner, slot: index })?;
        if let Some(n) = slot.uses_remaining.as_mut() {
            *n = n.saturating_add(amount);
        }
        Ok(slot.uses_remaining)
    }
}

/// Chance a battle roar of `level` scares a combatant of `target_level`
///
/// `(level + 1 - target_level)^2 / 10`, capped at 1. Targets at or above
/// `level + 1` are never scared.
pub fn battle_roar_chance(level: u32, target_level: u32) -> f32 {
    let margin = level as i64 + 1 - target_level as i64;
    if margin <= 0 {
        return 0.0;
    }
    ((margin * margin) as f32 / 10.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_aid_only() -> SpecialAbilities {
        SpecialAbilities::new(
            &StaminaConfig::default(),
            vec![AbilityConfig::new("First Aid", AbilityKind::first_aid()).with_cost(0.0)],
        )
    }

    #[test]
    fn test_first_aid_limited_to_max_uses() {
        let mut abilities = first_aid_only();
        let owner = CombatantId(1);
        for _ in 0..5 {
            assert_eq!(abilities.commit(owner, 0).expect("slot"), AbilityOutcome::Used);
        }
        assert_eq!(abilities.commit(owner, 0).expect("slot"), AbilityOutcome::NoUsesRemaining);
        assert_eq!(abilities.slot(owner, 0).expect("slot").uses_remaining(), Some(0));
    }

    #[test]
    fn test_add_uses() {
        let mut abilities = first_aid_only();
        let owner = CombatantId(1);
        assert_eq!(abilities.add_uses(owner, 0, 3).expect("slot"), Some(8));
    }

    #[test]
    fn test_out_of_stamina_consumes_nothing() {
        let mut abilities = SpecialAbilities::new(
            &StaminaConfig { max: 30.0, ..Default::default() },
            vec![AbilityConfig::new("First Aid", AbilityKind::first_aid())],
        );
        let owner = CombatantId(1);
        assert_eq!(abilities.commit(owner, 0).expect("slot"), AbilityOutcome::Used);
        assert_eq!(abilities.commit(owner, 0).expect("slot"), AbilityOutcome::OutOfStamina);
        assert_eq!(abilities.stamina.current(), 10.0);
        assert_eq!(abilities.slot(owner, 0).expect("slot").uses_remaining(), Some(4));
    }

    #[test]
    fn test_bad_slot_is_error() {
        let mut abilities = first_aid_only();
        assert!(matches!(
            abilities.commit(CombatantId(1), 3),
            Err(SkirmishError::AbilitySlotOutOfRange { slot: 3, .. })
        ));
    }

    #[test]
    fn test_battle_roar_chance() {
        assert!((battle_roar_chance(5, 5) - 0.1).abs() < 1e-6);
        assert!((battle_roar_chance(5, 3) - 0.9).abs() < 1e-6);
        assert_eq!(battle_roar_chance(5, 1), 1.0);
        assert_eq!(battle_roar_chance(5, 6), 0.0);
        assert_eq!(battle_roar_chance(5, 9), 0.0);
    }

    #[test]
    fn test_special_attack_adjustments() {
        let (adj, recovery) = AbilityKind::feigned_attack().special_attack().expect("special");
        assert_eq!(adj.attack_adj, 30.0);
        assert_eq!(adj.armor_avoid_adj, -0.1);
        assert_eq!(recovery, 1.0);
        assert!(AbilityKind::first_aid().special_attack().is_none());
    }

    #[test]
    fn test_ability_config_from_toml() {
        let config: AbilityConfig = toml::from_str(
            r#"
            name = "Roar"
            [kind]
            type = "battle_roar"
            level = 3
            radius = 6.0
            duration = 4.0
            "#,
        )
        .expect("ability should parse");
        assert_eq!(config.stamina_cost, 20.0);
        assert_eq!(config.kind, AbilityKind::BattleRoar { level: 3, radius: 6.0, duration: 4.0 });
    }
}
