use thiserror::Error;

use crate::core::types::{ArmorId, CombatantId, FormationId, WeaponId};

#[derive(Error, Debug)]
pub enum SkirmishError {
    #[error("Combatant not found: {0}")]
    CombatantNotFound(CombatantId),

    #[error("Formation not found: {0}")]
    FormationNotFound(FormationId),

    #[error("Unknown weapon profile: {0}")]
    UnknownWeapon(WeaponId),

    #[error("Unknown armor profile: {0}")]
    UnknownArmor(ArmorId),

    #[error("No dominant hand on {0}")]
    NoDominantHand(String),

    #[error("Multiple dominant hands on {name} ({count})")]
    MultipleDominantHands { name: String, count: usize },

    #[error("Global combat config missing: {0}")]
    MissingCombatConfig(String),

    #[error("Armory table missing: {0}")]
    MissingArmory(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Patrol route for {0} has no waypoints")]
    EmptyPatrolRoute(String),

    #[error("Ability slot {slot} out of range for {combatant}")]
    AbilitySlotOutOfRange { combatant: CombatantId, slot: usize },

    #[error("{0} has no special abilities")]
    NoAbilities(CombatantId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SkirmishError>;
