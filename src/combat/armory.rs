//! Read-only table of weapon and armor profiles
//!
//! Loaded once from `data/armory.toml` and shared by the whole world.
//! Combatants reference entries by id; nothing mutates a profile after load.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;

use crate::combat::armor::ArmorProfile;
use crate::combat::weapons::WeaponProfile;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::{ArmorId, WeaponId};

#[derive(Debug, Default, Deserialize)]
struct ArmoryFile {
    #[serde(default)]
    weapons: AHashMap<String, WeaponProfile>,
    #[serde(default)]
    armor: AHashMap<String, ArmorProfile>,
}

/// Weapon and armor lookup table
#[derive(Debug, Clone, Default)]
pub struct Armory {
    weapons: AHashMap<WeaponId, WeaponProfile>,
    armor: AHashMap<ArmorId, ArmorProfile>,
}

impl Armory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small built-in set used by tests and the sandbox demo
    pub fn with_defaults() -> Self {
        let mut armory = Self::new();
        armory.insert_weapon("sword", WeaponProfile::default());
        armory.insert_weapon(
            "spear",
            WeaponProfile {
                attack_range: 3.0,
                blade_modifier: 0.2,
                blunt_modifier: 0.1,
                pierce_modifier: 0.8,
                damage_delay: 0.6,
                ..Default::default()
            },
        );
        armory.insert_weapon(
            "mace",
            WeaponProfile {
                blade_modifier: 0.0,
                blunt_modifier: 0.8,
                pierce_modifier: 0.0,
                time_between_cycles: 1.4,
                ..Default::default()
            },
        );
        armory.insert_weapon(
            "bow",
            WeaponProfile {
                attack_range: 15.0,
                blade_modifier: 0.0,
                blunt_modifier: 0.0,
                pierce_modifier: 0.7,
                damage_delay: 0.8,
                block_delay: 0.6,
                ..Default::default()
            },
        );
        armory.insert_armor("leather", ArmorProfile::default());
        armory.insert_armor(
            "mail",
            ArmorProfile {
                coverage: 0.7,
                blade_amount: 35.0,
                blunt_amount: 15.0,
                pierce_amount: 20.0,
                ..Default::default()
            },
        );
        armory
    }

    /// Parse an armory from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ArmoryFile = toml::from_str(contents)?;
        let mut armory = Self::new();
        for (name, profile) in file.weapons {
            armory.insert_weapon(&name, profile);
        }
        for (name, profile) in file.armor {
            armory.insert_armor(&name, profile);
        }
        armory.validate()?;
        Ok(armory)
    }

    /// Load the armory from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SkirmishError::MissingArmory(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)?;
        let armory = Self::from_toml_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            weapons = armory.weapons.len(),
            armor = armory.armor.len(),
            "loaded armory"
        );
        Ok(armory)
    }

    /// Register a weapon; the profile takes the table key as its name
    pub fn insert_weapon(&mut self, name: &str, mut profile: WeaponProfile) -> WeaponId {
        let id = WeaponId::new(name);
        profile.name = name.to_string();
        self.weapons.insert(id.clone(), profile);
        id
    }

    /// Register an armor piece; the profile takes the table key as its name
    pub fn insert_armor(&mut self, name: &str, mut profile: ArmorProfile) -> ArmorId {
        let id = ArmorId::new(name);
        profile.name = name.to_string();
        self.armor.insert(id.clone(), profile);
        id
    }

    pub fn weapon(&self, id: &WeaponId) -> Result<&WeaponProfile> {
        self.weapons
            .get(id)
            .ok_or_else(|| SkirmishError::UnknownWeapon(id.clone()))
    }

    pub fn armor(&self, id: &ArmorId) -> Result<&ArmorProfile> {
        self.armor
            .get(id)
            .ok_or_else(|| SkirmishError::UnknownArmor(id.clone()))
    }

    pub fn weapon_count(&self) -> usize {
        self.weapons.len()
    }

    pub fn armor_count(&self) -> usize {
        self.armor.len()
    }

    fn validate(&self) -> Result<()> {
        for (id, weapon) in &self.weapons {
            if weapon.attack_range <= 0.0 {
                return Err(SkirmishError::InvalidConfig(format!(
                    "weapon {} has non-positive attack_range {}",
                    id, weapon.attack_range
                )));
            }
            if weapon.damage_delay < 0.0 || weapon.block_delay < 0.0 {
                return Err(SkirmishError::InvalidConfig(format!(
                    "weapon {} has a negative delay",
                    id
                )));
            }
            if weapon.swing_seconds < 0.0
                || weapon.time_between_cycles < 0.0
                || weapon.swing_seconds + weapon.time_between_cycles <= 0.0
            {
                return Err(SkirmishError::InvalidConfig(format!(
                    "weapon {} needs a positive attack cycle",
                    id
                )));
            }
        }
        for (id, armor) in &self.armor {
            if !(0.0..=1.0).contains(&armor.coverage) {
                return Err(SkirmishError::InvalidConfig(format!(
                    "armor {} coverage {} must be within [0, 1]",
                    id, armor.coverage
                )));
            }
        }
        Ok(())
    }
}
