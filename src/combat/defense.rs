//! Defender side of an exchange: block roll, armor mitigation, block latch
//!
//! The resolver decides the outcome immediately. Applying the damage or
//! playing the block is left to the caller's scheduler, which re-validates
//! both combatants when the delay elapses.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::armor::{ArmorLoadout, ArmorProfile};
use crate::combat::armory::Armory;
use crate::combat::body_zone::HitLocation;
use crate::combat::event::AttackEvent;
use crate::combat::math::{self, DamagePacket};
use crate::combat::weapons::WeaponProfile;
use crate::core::config::DefenseTuning;

/// What the defender needs to know about its surroundings
pub struct DefenseContext<'a> {
    pub armory: &'a Armory,
    /// Weapon the defender blocks with
    pub own_weapon: &'a WeaponProfile,
    pub tuning: &'a DefenseTuning,
    pub is_player: bool,
}

/// Outcome of one incoming attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefenseOutcome {
    /// Damage lands after `delay` seconds
    Hit {
        location: HitLocation,
        armor_absorbed: bool,
        damage: DamagePacket,
        delay: f32,
    },
    /// Block feedback plays after `feedback_delay`; the latch is now held
    Blocked { feedback_delay: f32 },
    /// Blocked, but the defender is still recovering from a previous block
    BlockedWhileRecovering,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefenseResolver {
    pub block_bonus: f32,
    pub armor: ArmorLoadout,
    blocking: bool,
}

impl DefenseResolver {
    pub fn new(block_bonus: f32, armor: ArmorLoadout) -> Self {
        Self {
            block_bonus,
            armor,
            blocking: false,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Block recovery finished
    pub fn release_block(&mut self) {
        self.blocking = false;
    }

    /// Resolve an incoming attack
    pub fn defend(
        &mut self,
        event: &AttackEvent,
        ctx: &DefenseContext<'_>,
        rng: &mut impl Rng,
    ) -> DefenseOutcome {
        let defense_score =
            math::roll_defense_score(rng, self.block_bonus, event.direction_penalty);

        if math::roll_hit(event.attack_score, defense_score) {
            let location = HitLocation::roll(rng);
            let (mut absorption, armor_absorbed) =
                self.roll_absorption(location, event.armor_avoid_adj, ctx.armory, rng);
            if ctx.is_player && ctx.tuning.player_armor_bonus > 0.0 {
                absorption = absorption + DamagePacket::uniform(ctx.tuning.player_armor_bonus);
            }
            let damage = event.raw.mitigate(&absorption);

            tracing::debug!(
                attacker = %event.attacker,
                defender = %event.target,
                %location,
                armor_absorbed,
                blade = damage.blade,
                blunt = damage.blunt,
                pierce = damage.pierce,
                "attack hits"
            );

            return DefenseOutcome::Hit {
                location,
                armor_absorbed,
                damage,
                delay: event.damage_delay,
            };
        }

        if self.blocking {
            tracing::debug!(defender = %event.target, "blocked while still recovering");
            return DefenseOutcome::BlockedWhileRecovering;
        }

        self.blocking = true;
        let feedback_delay = ctx.own_weapon.block_feedback_delay(event.damage_delay);
        tracing::debug!(
            attacker = %event.attacker,
            defender = %event.target,
            attack_score = event.attack_score,
            defense_score,
            "attack blocked"
        );
        DefenseOutcome::Blocked { feedback_delay }
    }

    fn armor_at<'a>(&self, location: HitLocation, armory: &'a Armory) -> Option<&'a ArmorProfile> {
        let id = self.armor.get(location)?;
        match armory.armor(id) {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::warn!(%err, "armor lookup failed, treating location as bare");
                None
            }
        }
    }

    fn roll_absorption(
        &self,
        location: HitLocation,
        avoid_adj: f32,
        armory: &Armory,
        rng: &mut impl Rng,
    ) -> (DamagePacket, bool) {
        match self.armor_at(location, armory) {
            Some(piece) if math::roll_armor_absorbs(rng, piece.effective_coverage(), avoid_adj) => {
                (piece.absorption(), true)
            }
            _ => (DamagePacket::default(), false),
        }
    }
}
