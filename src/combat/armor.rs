//! Armor profiles and per-location loadouts
//!
//! Armor only absorbs when the coverage roll succeeds, so a piece with 0.4
//! coverage stops damage on roughly two in five hits to its location.

use serde::{Deserialize, Serialize};

use crate::combat::body_zone::HitLocation;
use crate::combat::constants::*;
use crate::combat::math::DamagePacket;
use crate::core::types::ArmorId;

/// Static stats of one armor piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorProfile {
    pub name: String,
    /// Base probability the piece is struck, before condition
    pub coverage: f32,
    pub blade_amount: f32,
    pub blunt_amount: f32,
    pub pierce_amount: f32,
    pub quality: f32,
    pub condition: f32,
}

impl Default for ArmorProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            coverage: DEFAULT_ARMOR_COVERAGE,
            blade_amount: DEFAULT_ARMOR_AMOUNT,
            blunt_amount: DEFAULT_ARMOR_AMOUNT,
            pierce_amount: DEFAULT_ARMOR_AMOUNT,
            quality: DEFAULT_ARMOR_QUALITY,
            condition: DEFAULT_ARMOR_CONDITION,
        }
    }
}

impl ArmorProfile {
    /// Coverage degraded by condition
    pub fn effective_coverage(&self) -> f32 {
        self.coverage * self.condition
    }

    /// Per-type absorption scaled by quality and condition
    pub fn absorption(&self) -> DamagePacket {
        let wear = self.quality * self.condition;
        DamagePacket::new(
            self.blade_amount * wear,
            self.blunt_amount * wear,
            self.pierce_amount * wear,
        )
    }
}

/// Which armor piece, if any, covers each location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorLoadout {
    pub head: Option<ArmorId>,
    pub body: Option<ArmorId>,
    pub arm: Option<ArmorId>,
    pub leg: Option<ArmorId>,
}

impl ArmorLoadout {
    /// Same piece on every location
    pub fn full(armor: ArmorId) -> Self {
        Self {
            head: Some(armor.clone()),
            body: Some(armor.clone()),
            arm: Some(armor.clone()),
            leg: Some(armor),
        }
    }

    pub fn get(&self, location: HitLocation) -> Option<&ArmorId> {
        match location {
            HitLocation::Head => self.head.as_ref(),
            HitLocation::Body => self.body.as_ref(),
            HitLocation::Arm => self.arm.as_ref(),
            HitLocation::Leg => self.leg.as_ref(),
        }
    }

    pub fn set(&mut self, location: HitLocation, armor: Option<ArmorId>) {
        let slot = match location {
            HitLocation::Head => &mut self.head,
            HitLocation::Body => &mut self.body,
            HitLocation::Arm => &mut self.arm,
            HitLocation::Leg => &mut self.leg,
        };
        *slot = armor;
    }

    /// Every armor id referenced by this loadout
    pub fn pieces(&self) -> impl Iterator<Item = &ArmorId> {
        HitLocation::all().into_iter().filter_map(move |loc| self.get(loc))
    }
}
