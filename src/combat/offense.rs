//! Attacker side of an exchange: attack loop state and attack construction
//!
//! The controller owns the "am I attacking, and whom" state. Timing is done by
//! the world's scheduler on the combatant's offense lane; the controller only
//! tells the world whether a cycle should start now, later, or not at all.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::event::{AttackAdjustments, AttackEvent};
use crate::combat::math;
use crate::combat::weapons::{AttackKind, WeaponProfile};
use crate::core::types::{CombatantId, WeaponId};

/// Liveness and reach, recomputed every tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenseFlags {
    pub attacker_alive: bool,
    pub target_alive: bool,
    pub target_in_range: bool,
}

impl OffenseFlags {
    pub fn can_attack(&self) -> bool {
        self.attacker_alive && self.target_alive && self.target_in_range
    }
}

/// How the world should kick off an attack loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CycleStart {
    /// A loop is already running against this target
    AlreadyAttacking,
    /// Run the first iteration right away
    Immediate,
    /// Run the first iteration after the given delay
    Delayed(f32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffenseController {
    pub attack_bonus: f32,
    pub base_damage: f32,
    weapon: WeaponId,
    target: Option<CombatantId>,
    attacking: bool,
    flags: OffenseFlags,
}

impl OffenseController {
    pub fn new(weapon: WeaponId, attack_bonus: f32, base_damage: f32) -> Self {
        Self {
            attack_bonus,
            base_damage,
            weapon,
            target: None,
            attacking: false,
            flags: OffenseFlags::default(),
        }
    }

    pub fn weapon(&self) -> &WeaponId {
        &self.weapon
    }

    /// Rebind to a different weapon profile
    pub fn set_weapon(&mut self, weapon: WeaponId) {
        self.weapon = weapon;
    }

    pub fn target(&self) -> Option<CombatantId> {
        self.target
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn flags(&self) -> OffenseFlags {
        self.flags
    }

    /// Store this tick's flags; true if a running loop must now stop
    pub fn update_flags(&mut self, flags: OffenseFlags) -> bool {
        self.flags = flags;
        self.attacking && !flags.can_attack()
    }

    /// Set or clear the target; clearing also ends the loop
    ///
    /// Returns true when a running loop was stopped and its timers need
    /// cancelling.
    pub fn set_target(&mut self, target: Option<CombatantId>) -> bool {
        self.target = target;
        if target.is_none() {
            return self.stop();
        }
        false
    }

    /// Begin the attack loop against `target`
    ///
    /// AI combatants hold the first swing for the weapon's damage delay so a
    /// group engaging at once does not strike in lockstep.
    pub fn start_attacking(
        &mut self,
        target: CombatantId,
        ai_controlled: bool,
        weapon: &WeaponProfile,
    ) -> CycleStart {
        self.target = Some(target);
        if self.attacking {
            return CycleStart::AlreadyAttacking;
        }
        self.attacking = true;
        if ai_controlled && weapon.damage_delay > 0.0 {
            CycleStart::Delayed(weapon.damage_delay)
        } else {
            CycleStart::Immediate
        }
    }

    /// Whether switching to `target` requires tearing down the current loop
    pub fn needs_restart_for(&self, target: CombatantId) -> bool {
        self.target != Some(target) || !self.attacking
    }

    /// Mark the loop stopped; true if it was running
    pub fn stop(&mut self) -> bool {
        let was_attacking = self.attacking;
        self.attacking = false;
        was_attacking
    }

    /// Build one attack against `target`
    pub fn build_attack(
        &self,
        attacker: CombatantId,
        target: CombatantId,
        weapon: &WeaponProfile,
        direction_penalty: f32,
        adj: AttackAdjustments,
        rng: &mut impl Rng,
    ) -> AttackEvent {
        let attack_score = math::roll_score(rng, self.attack_bonus + adj.attack_adj);
        let kind = if rng.gen::<f32>() <= weapon.swing_chance() {
            AttackKind::Swing
        } else {
            AttackKind::Thrust
        };
        AttackEvent {
            attacker,
            target,
            kind,
            attack_score,
            direction_penalty,
            raw: weapon.raw_damage(kind, self.base_damage + adj.damage_adj),
            armor_avoid_adj: adj.armor_avoid_adj,
            damage_delay: weapon.damage_delay,
        }
    }

    /// Wait before the next iteration, with the cadence jittered by ±`jitter`
    pub fn next_cycle_delay(
        &self,
        weapon: &WeaponProfile,
        animation_speed: f32,
        jitter: f32,
        rng: &mut impl Rng,
    ) -> f32 {
        let factor = if jitter > 0.0 {
            1.0 + rng.gen_range(-jitter..=jitter)
        } else {
            1.0
        };
        weapon.cycle_seconds(animation_speed, factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn controller() -> OffenseController {
        OffenseController::new(WeaponId::new("sword"), 100.0, 220.0)
    }

    #[test]
    fn test_ai_start_is_delayed_player_is_not() {
        let weapon = WeaponProfile::default();
        let mut ai = controller();
        assert_eq!(ai.start_attacking(CombatantId(2), true, &weapon), CycleStart::Delayed(0.5));
        let mut player = controller();
        assert_eq!(player.start_attacking(CombatantId(2), false, &weapon), CycleStart::Immediate);
    }

    #[test]
    fn test_start_is_noop_while_attacking() {
        let weapon = WeaponProfile::default();
        let mut offense = controller();
        offense.start_attacking(CombatantId(2), true, &weapon);
        assert_eq!(
            offense.start_attacking(CombatantId(2), true, &weapon),
            CycleStart::AlreadyAttacking
        );
        assert!(offense.is_attacking());
    }

    #[test]
    fn test_restart_only_for_new_target() {
        let weapon = WeaponProfile::default();
        let mut offense = controller();
        offense.start_attacking(CombatantId(2), true, &weapon);
        assert!(!offense.needs_restart_for(CombatantId(2)));
        assert!(offense.needs_restart_for(CombatantId(3)));
        offense.stop();
        assert!(offense.needs_restart_for(CombatantId(2)));
    }

    #[test]
    fn test_clearing_target_stops_loop() {
        let weapon = WeaponProfile::default();
        let mut offense = controller();
        offense.start_attacking(CombatantId(2), false, &weapon);
        assert!(offense.set_target(None));
        assert!(!offense.is_attacking());
        assert!(offense.target().is_none());
    }

    #[test]
    fn test_flags_stop_running_loop() {
        let weapon = WeaponProfile::default();
        let mut offense = controller();
        let ok = OffenseFlags { attacker_alive: true, target_alive: true, target_in_range: true };
        assert!(!offense.update_flags(ok));
        offense.start_attacking(CombatantId(2), false, &weapon);
        assert!(!offense.update_flags(ok));
        let out_of_range = OffenseFlags { target_in_range: false, ..ok };
        assert!(offense.update_flags(out_of_range));
    }

    #[test]
    fn test_build_attack_respects_weapon_kind() {
        let offense = controller();
        let mace = WeaponProfile {
            blade_modifier: 0.0,
            blunt_modifier: 1.0,
            pierce_modifier: 0.0,
            quality: 1.0,
            condition: 1.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let event = offense.build_attack(
                CombatantId(1),
                CombatantId(2),
                &mace,
                0.3,
                AttackAdjustments { damage_adj: 30.0, ..Default::default() },
                &mut rng,
            );
            assert_eq!(event.kind, AttackKind::Swing);
            assert_eq!(event.raw.blunt, 250.0);
            assert_eq!(event.raw.pierce, 0.0);
            assert_eq!(event.direction_penalty, 0.3);
            assert!(event.attack_score > 100.0 && event.attack_score <= 200.0);
        }
    }

    #[test]
    fn test_cycle_delay_within_jitter() {
        let offense = controller();
        let weapon = WeaponProfile::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..200 {
            let delay = offense.next_cycle_delay(&weapon, 1.0, 0.2, &mut rng);
            assert!((1.8..=2.2).contains(&delay), "delay {}", delay);
        }
        assert_eq!(offense.next_cycle_delay(&weapon, 1.0, 0.0, &mut rng), 2.0);
    }
}
