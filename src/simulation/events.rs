//! Events produced by a world tick
//!
//! These are returned by [`World::tick`](crate::simulation::World::tick) for
//! the presentation layer and the demo log.

use serde::{Deserialize, Serialize};

use crate::ai::state::DirectorState;
use crate::combat::body_zone::HitLocation;
use crate::combat::weapons::AttackKind;
use crate::core::types::{CombatantId, FormationId, Vec2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// An attack was issued
    Attack {
        attacker: CombatantId,
        target: CombatantId,
        kind: AttackKind,
    },
    /// The defender failed to block; damage lands after the weapon's delay
    Hit {
        attacker: CombatantId,
        defender: CombatantId,
        location: HitLocation,
        armor_absorbed: bool,
        damage: f32,
    },
    Blocked {
        attacker: CombatantId,
        defender: CombatantId,
    },
    /// Health actually changed
    Damaged {
        combatant: CombatantId,
        amount: f32,
        remaining: f32,
    },
    Healed {
        combatant: CombatantId,
        amount: f32,
    },
    /// Scheduled damage dropped because one side died or vanished first
    DamageDiscarded {
        attacker: CombatantId,
        defender: CombatantId,
    },
    Died {
        combatant: CombatantId,
    },
    /// The player died; the host decides what happens next
    PlayerDefeated {
        combatant: CombatantId,
    },
    Despawned {
        combatant: CombatantId,
    },
    StateChanged {
        combatant: CombatantId,
        from: DirectorState,
        to: DirectorState,
    },
    FleeStarted {
        combatant: CombatantId,
        destination: Vec2,
        returning: bool,
    },
    FormationDissolved {
        formation: FormationId,
    },
    FormationAdvanced {
        formation: FormationId,
        anchor: Vec2,
    },
    AllegianceChanged {
        combatant: CombatantId,
        is_enemy: bool,
    },
    AbilityUsed {
        combatant: CombatantId,
        ability: String,
    },
    WeaponEquipped {
        combatant: CombatantId,
        weapon: String,
    },
}

impl CombatEvent {
    /// Combatant the event is primarily about
    pub fn subject(&self) -> Option<CombatantId> {
        match self {
            CombatEvent::Attack { attacker, .. }
            | CombatEvent::Hit { attacker, .. }
            | CombatEvent::Blocked { attacker, .. }
            | CombatEvent::DamageDiscarded { attacker, .. } => Some(*attacker),
            CombatEvent::Damaged { combatant, .. }
            | CombatEvent::Healed { combatant, .. }
            | CombatEvent::Died { combatant }
            | CombatEvent::PlayerDefeated { combatant }
            | CombatEvent::Despawned { combatant }
            | CombatEvent::StateChanged { combatant, .. }
            | CombatEvent::FleeStarted { combatant, .. }
            | CombatEvent::AllegianceChanged { combatant, .. }
            | CombatEvent::AbilityUsed { combatant, .. }
            | CombatEvent::WeaponEquipped { combatant, .. } => Some(*combatant),
            CombatEvent::FormationDissolved { .. } | CombatEvent::FormationAdvanced { .. } => None,
        }
    }
}
