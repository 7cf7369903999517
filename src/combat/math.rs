//! Pure combat arithmetic: score rolls, direction penalties, armor mitigation
//!
//! Nothing here holds state. Callers pass in the RNG and whatever tuning
//! they need, which keeps every rule testable in isolation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::constants::{FRONT_ARC_DEGREES, SIDE_ARC_DEGREES};
use crate::core::config::DefenseTuning;
use crate::core::types::Vec2;

/// Per-type damage (or per-type absorption) triple
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamagePacket {
    pub blade: f32,
    pub blunt: f32,
    pub pierce: f32,
}

impl DamagePacket {
    pub fn new(blade: f32, blunt: f32, pierce: f32) -> Self {
        Self { blade, blunt, pierce }
    }

    /// Same value for all three types
    pub fn uniform(amount: f32) -> Self {
        Self::new(amount, amount, amount)
    }

    pub fn total(&self) -> f32 {
        self.blade + self.blunt + self.pierce
    }

    /// Subtract absorption from each type independently
    pub fn mitigate(&self, absorption: &DamagePacket) -> DamagePacket {
        DamagePacket {
            blade: apply_armor(self.blade, absorption.blade),
            blunt: apply_armor(self.blunt, absorption.blunt),
            pierce: apply_armor(self.pierce, absorption.pierce),
        }
    }
}

impl std::ops::Add for DamagePacket {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            blade: self.blade + rhs.blade,
            blunt: self.blunt + rhs.blunt,
            pierce: self.pierce + rhs.pierce,
        }
    }
}

/// `uniform_int(1, 100) + bonus`
pub fn roll_score(rng: &mut impl Rng, bonus: f32) -> f32 {
    rng.gen_range(1..=100u32) as f32 + bonus
}

/// Defense score with the block bonus reduced by the direction penalty
pub fn roll_defense_score(rng: &mut impl Rng, block_bonus: f32, penalty: f32) -> f32 {
    roll_score(rng, block_bonus * (1.0 - penalty))
}

/// The attack lands iff it strictly beats the defense
pub fn roll_hit(attack_score: f32, defense_score: f32) -> bool {
    attack_score > defense_score
}

/// Penalty fraction for an attack arriving `angle_deg` away from the defender's facing
pub fn resolve_defense_penalty(angle_deg: f32, tuning: &DefenseTuning) -> f32 {
    if angle_deg <= FRONT_ARC_DEGREES {
        0.0
    } else if angle_deg <= SIDE_ARC_DEGREES {
        tuning.side_defence_penalty
    } else {
        tuning.rear_defence_penalty
    }
}

/// Angle between the defender's facing and the direction the attack comes from
pub fn attack_angle(attacker: Vec2, defender: Vec2, defender_facing: Vec2) -> f32 {
    (attacker - defender).angle_to(&defender_facing)
}

/// `clamp(raw - armor, 0, raw)`; never negative, never more than raw
pub fn apply_armor(raw: f32, armor: f32) -> f32 {
    let raw = raw.max(0.0);
    (raw - armor.max(0.0)).clamp(0.0, raw)
}

/// Probability that the armor on the struck location absorbs the blow
pub fn armor_absorb_chance(coverage: f32, avoid_adj: f32) -> f32 {
    (coverage - avoid_adj).clamp(0.0, 1.0)
}

/// Roll whether armor absorbs; a zero chance never absorbs
pub fn roll_armor_absorbs(rng: &mut impl Rng, coverage: f32, avoid_adj: f32) -> bool {
    let chance = armor_absorb_chance(coverage, avoid_adj);
    chance > 0.0 && rng.gen::<f32>() <= chance
}

/// Exact probability that `d100 + attack_bonus > d100 + defense_bonus`
pub fn theoretical_hit_chance(attack_bonus: f32, defense_bonus: f32) -> f64 {
    let mut wins = 0u32;
    for a in 1..=100u32 {
        for d in 1..=100u32 {
            if roll_hit(a as f32 + attack_bonus, d as f32 + defense_bonus) {
                wins += 1;
            }
        }
    }
    wins as f64 / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roll_hit_is_strict() {
        assert!(roll_hit(150.0, 149.0));
        assert!(!roll_hit(150.0, 150.0));
        assert!(!roll_hit(10.0, 150.0));
    }

    #[test]
    fn test_penalty_boundaries() {
        let tuning = DefenseTuning::default();
        assert_eq!(resolve_defense_penalty(0.0, &tuning), 0.0);
        assert_eq!(resolve_defense_penalty(45.0, &tuning), 0.0);
        assert_eq!(resolve_defense_penalty(45.01, &tuning), 0.3);
        assert_eq!(resolve_defense_penalty(135.0, &tuning), 0.3);
        assert_eq!(resolve_defense_penalty(135.01, &tuning), 0.5);
        assert_eq!(resolve_defense_penalty(180.0, &tuning), 0.5);
    }

    #[test]
    fn test_attack_angle_from_front_side_rear() {
        let defender = Vec2::new(0.0, 0.0);
        let facing = Vec2::new(0.0, 1.0);
        assert!(attack_angle(Vec2::new(0.0, 2.0), defender, facing) < 1.0);
        assert!((attack_angle(Vec2::new(2.0, 0.0), defender, facing) - 90.0).abs() < 0.01);
        assert!((attack_angle(Vec2::new(0.0, -2.0), defender, facing) - 180.0).abs() < 0.01);
    }

    #[test]
    fn test_apply_armor_clamps() {
        assert_eq!(apply_armor(50.0, 20.0), 30.0);
        assert_eq!(apply_armor(10.0, 20.0), 0.0);
        assert_eq!(apply_armor(10.0, 0.0), 10.0);
        assert_eq!(apply_armor(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_mitigate_sums_per_type() {
        let raw = DamagePacket::new(40.0, 40.0, 0.0);
        let armor = DamagePacket::uniform(12.8);
        let taken = raw.mitigate(&armor);
        assert!((taken.total() - 54.4).abs() < 0.001);
        assert_eq!(taken.pierce, 0.0);
    }

    #[test]
    fn test_absorb_chance_clamped() {
        assert_eq!(armor_absorb_chance(0.32, 0.5), 0.0);
        assert_eq!(armor_absorb_chance(0.9, -0.5), 1.0);
        assert!((armor_absorb_chance(0.32, 0.0) - 0.32).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_chance_never_absorbs() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(!roll_armor_absorbs(&mut rng, 0.2, 0.3));
        }
    }

    #[test]
    fn test_full_chance_always_absorbs() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(roll_armor_absorbs(&mut rng, 1.0, 0.0));
        }
    }

    #[test]
    fn test_theoretical_hit_chance() {
        // 100 vs 110: attacker needs to out-roll by more than 10
        let p = theoretical_hit_chance(100.0, 110.0);
        assert!((p - 0.4005).abs() < 1e-9);
        // Mirror match is just under a coin flip (ties go to the defender)
        assert!((theoretical_hit_chance(0.0, 0.0) - 0.495).abs() < 1e-9);
    }
}
