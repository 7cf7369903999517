//! Formations: grouped AI combatants with shared morale
//!
//! A formation holds member ids only; it never owns combatant lifecycle.
//! Index 0 is the leader. Losing the leader dissolves the formation; losing
//! enough rank and file makes the survivors start to break and run.

use ahash::AHashSet;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::director::FormationLink;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::{CombatantId, FormationId, Vec2};

/// Scripted one-off advance, triggered when the player comes close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvanceOrder {
    /// Where the formation anchor moves to
    pub to: Vec2,
    /// Seconds between the trigger and the move
    pub delay: f32,
    /// Player distance from the anchor that triggers the advance
    pub trigger_distance: f32,
}

impl Default for AdvanceOrder {
    fn default() -> Self {
        Self {
            to: Vec2::ZERO,
            delay: 3.0,
            trigger_distance: 10.0,
        }
    }
}

/// Authoring data for a formation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationBlueprint {
    pub name: String,
    pub anchor: Vec2,
    pub facing: Vec2,
    /// Slot offsets from the anchor, leader slot first
    pub slots: Vec<Vec2>,
    /// Casualty fraction the formation tolerates before members start to flee
    pub morale: f32,
    /// Aggro distance of members while in formation
    pub aggro_distance: f32,
    pub advance: Option<AdvanceOrder>,
}

impl Default for FormationBlueprint {
    fn default() -> Self {
        Self {
            name: String::new(),
            anchor: Vec2::ZERO,
            facing: Vec2::new(0.0, 1.0),
            slots: Vec::new(),
            morale: 0.5,
            aggro_distance: 3.0,
            advance: None,
        }
    }
}

/// What the world knows about a formation's members this tick
#[derive(Debug, Clone)]
pub struct FormationTick<'a> {
    /// Leader still resolves to a living combatant
    pub leader_valid: bool,
    /// Members that resolve to living combatants
    pub alive: &'a [CombatantId],
    pub player_position: Option<Vec2>,
    pub dt: f32,
}

/// Instructions for the world
#[derive(Debug, Clone, PartialEq)]
pub enum FormationOrder {
    /// Release every member and remove the formation
    Dissolve,
    /// These members break and flee without returning
    Flee(Vec<CombatantId>),
    /// Move the anchor to the advance point after `delay`
    ScheduleAdvance { delay: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationCoordinator {
    id: FormationId,
    pub name: String,
    members: Vec<CombatantId>,
    slots: Vec<Vec2>,
    anchor: Vec2,
    facing: Vec2,
    pub morale: f32,
    pub aggro_distance: f32,
    is_enemy: bool,
    advance: Option<AdvanceOrder>,
    advance_triggered: bool,
}

impl FormationCoordinator {
    pub fn new(
        id: FormationId,
        blueprint: FormationBlueprint,
        members: Vec<CombatantId>,
        is_enemy: bool,
    ) -> Result<Self> {
        if members.is_empty() {
            return Err(SkirmishError::InvalidConfig(format!(
                "formation {} has no members",
                blueprint.name
            )));
        }
        if members.len() > blueprint.slots.len() {
            return Err(SkirmishError::InvalidConfig(format!(
                "formation {} has too many troopers assigned ({} members, {} slots)",
                blueprint.name,
                members.len(),
                blueprint.slots.len()
            )));
        }
        let mut seen = AHashSet::with_capacity(members.len());
        if let Some(duplicate) = members.iter().find(|&&m| !seen.insert(m)) {
            return Err(SkirmishError::InvalidConfig(format!(
                "formation {} lists {} more than once",
                blueprint.name, duplicate
            )));
        }
        if !(0.0..=1.0).contains(&blueprint.morale) {
            return Err(SkirmishError::InvalidConfig(format!(
                "formation {} morale {} must be within [0, 1]",
                blueprint.name, blueprint.morale
            )));
        }
        Ok(Self {
            id,
            name: blueprint.name,
            members,
            slots: blueprint.slots,
            anchor: blueprint.anchor,
            facing: blueprint.facing,
            morale: blueprint.morale,
            aggro_distance: blueprint.aggro_distance,
            is_enemy,
            advance: blueprint.advance,
            advance_triggered: false,
        })
    }

    pub fn id(&self) -> FormationId {
        self.id
    }

    pub fn leader(&self) -> Option<CombatantId> {
        self.members.first().copied()
    }

    pub fn members(&self) -> &[CombatantId] {
        &self.members
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    pub fn is_enemy(&self) -> bool {
        self.is_enemy
    }

    pub fn set_allegiance(&mut self, is_enemy: bool) {
        self.is_enemy = is_enemy;
    }

    /// Add a member to the next free slot
    pub fn add_member(&mut self, member: CombatantId) -> Result<()> {
        if self.members.len() >= self.slots.len() {
            return Err(SkirmishError::InvalidConfig(format!(
                "formation {} has no free slot",
                self.name
            )));
        }
        if self.members.contains(&member) {
            return Err(SkirmishError::InvalidConfig(format!(
                "{} already belongs to formation {}",
                member, self.name
            )));
        }
        self.members.push(member);
        Ok(())
    }

    /// World position of a member's slot
    pub fn slot_of(&self, member: CombatantId) -> Option<Vec2> {
        let index = self.members.iter().position(|&m| m == member)?;
        self.slots.get(index).map(|offset| self.anchor + *offset)
    }

    /// What a member's director needs to know about the formation
    pub fn link_for(&self, member: CombatantId) -> Option<FormationLink> {
        self.slot_of(member).map(|slot| FormationLink {
            aggro_distance: self.aggro_distance,
            slot,
        })
    }

    /// Fraction of the original members no longer alive
    pub fn casualty_percent(&self, alive_count: usize) -> f32 {
        1.0 - alive_count as f32 / self.members.len() as f32
    }

    /// `casualty_percent - morale`; only positive values cause flight
    pub fn flee_chance(&self, alive_count: usize) -> f32 {
        self.casualty_percent(alive_count) - self.morale
    }

    /// Per-member chance of breaking during a tick of length `dt`
    pub fn member_flee_probability(&self, alive_count: usize, dt: f32) -> f32 {
        self.flee_chance(alive_count).max(0.0) * dt
    }

    /// Run the per-tick morale check and advance trigger
    pub fn tick(&mut self, tick: &FormationTick<'_>, rng: &mut impl Rng) -> Vec<FormationOrder> {
        if !tick.leader_valid {
            return vec![FormationOrder::Dissolve];
        }

        let mut orders = Vec::new();

        let chance = self.flee_chance(tick.alive.len());
        if chance > 0.0 {
            let threshold = chance * tick.dt;
            let breaking: Vec<CombatantId> = tick
                .alive
                .iter()
                .copied()
                .filter(|_| rng.gen::<f32>() <= threshold)
                .collect();
            if !breaking.is_empty() {
                tracing::info!(
                    formation = %self.id,
                    flee_chance = chance,
                    count = breaking.len(),
                    "formation morale breaking"
                );
                orders.push(FormationOrder::Flee(breaking));
            }
        }

        if let (Some(advance), Some(player)) = (&self.advance, tick.player_position) {
            if !self.advance_triggered && self.anchor.distance(&player) <= advance.trigger_distance {
                self.advance_triggered = true;
                orders.push(FormationOrder::ScheduleAdvance { delay: advance.delay });
            }
        }

        orders
    }

    /// Move the anchor onto the advance point; slots follow
    pub fn complete_advance(&mut self) -> Option<Vec2> {
        let to = self.advance.as_ref()?.to;
        self.anchor = to;
        Some(to)
    }
}
