//! Attack events passed from an attacker to a defender

use serde::{Deserialize, Serialize};

use crate::combat::math::DamagePacket;
use crate::combat::weapons::AttackKind;
use crate::core::types::CombatantId;

/// Optional adjustments applied to a single attack (special moves)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackAdjustments {
    pub attack_adj: f32,
    pub damage_adj: f32,
    /// Subtracted from armor coverage; negative values make armor more likely to absorb
    pub armor_avoid_adj: f32,
}

/// One attack, produced by the attacker and consumed once by the defender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackEvent {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub kind: AttackKind,
    pub attack_score: f32,
    /// Fraction of the defender's block bonus lost to the attack direction
    pub direction_penalty: f32,
    pub raw: DamagePacket,
    pub armor_avoid_adj: f32,
    pub damage_delay: f32,
}
