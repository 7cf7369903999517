//! Combatant records and the blueprints they are spawned from

use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityConfig, SpecialAbilities, StaminaConfig};
use crate::ai::director::{CombatantDirector, DirectorProfile};
use crate::ai::patrol::PatrolRoute;
use crate::combat::armor::ArmorLoadout;
use crate::combat::armory::Armory;
use crate::combat::constants::{
    DEFAULT_ANIMATION_SPEED, DEFAULT_ATTACK_BONUS, DEFAULT_BASE_DAMAGE, DEFAULT_BLOCK_BONUS,
    DEFAULT_LEVEL, DEFAULT_MAX_HEALTH,
};
use crate::combat::defense::DefenseResolver;
use crate::combat::health::HealthTracker;
use crate::combat::offense::OffenseController;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::{CombatantId, FormationId, Vec2, WeaponId};

/// Who drives the combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    Player,
    #[default]
    Ai,
}

/// A weapon held in one hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandSlot {
    pub weapon: WeaponId,
    /// The dominant hand's weapon is the one used to attack and block
    #[serde(default)]
    pub dominant: bool,
}

/// Authoring data for one combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatantBlueprint {
    pub name: String,
    pub controller: Controller,
    /// Ignored for the player, who is never an enemy
    pub is_enemy: bool,
    pub level: u32,
    pub max_health: f32,
    pub attack_bonus: f32,
    pub block_bonus: f32,
    pub base_damage: f32,
    pub animation_speed: f32,
    pub hands: Vec<HandSlot>,
    pub armor: ArmorLoadout,
    pub position: Vec2,
    pub facing: Vec2,
    pub director: DirectorProfile,
    /// Empty means no patrol
    pub patrol: Vec<Vec2>,
    pub stamina: StaminaConfig,
    pub abilities: Vec<AbilityConfig>,
}

impl Default for CombatantBlueprint {
    fn default() -> Self {
        Self {
            name: String::new(),
            controller: Controller::Ai,
            is_enemy: false,
            level: DEFAULT_LEVEL,
            max_health: DEFAULT_MAX_HEALTH,
            attack_bonus: DEFAULT_ATTACK_BONUS,
            block_bonus: DEFAULT_BLOCK_BONUS,
            base_damage: DEFAULT_BASE_DAMAGE,
            animation_speed: DEFAULT_ANIMATION_SPEED,
            hands: Vec::new(),
            armor: ArmorLoadout::default(),
            position: Vec2::ZERO,
            facing: Vec2::new(0.0, 1.0),
            director: DirectorProfile::default(),
            patrol: Vec::new(),
            stamina: StaminaConfig::default(),
            abilities: Vec::new(),
        }
    }
}

impl CombatantBlueprint {
    /// AI combatant holding `weapon` in its dominant hand
    pub fn ai(name: impl Into<String>, weapon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hands: vec![HandSlot { weapon: WeaponId::new(weapon), dominant: true }],
            ..Default::default()
        }
    }

    pub fn player(name: impl Into<String>, weapon: impl Into<String>) -> Self {
        Self {
            controller: Controller::Player,
            ..Self::ai(name, weapon)
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn facing(mut self, facing: Vec2) -> Self {
        self.facing = facing;
        self
    }

    pub fn hostile(mut self) -> Self {
        self.is_enemy = true;
        self
    }

    pub fn with_armor(mut self, armor: ArmorLoadout) -> Self {
        self.armor = armor;
        self
    }

    pub fn with_patrol(mut self, waypoints: Vec<Vec2>) -> Self {
        self.patrol = waypoints;
        self
    }

    pub fn with_abilities(mut self, abilities: Vec<AbilityConfig>) -> Self {
        self.abilities = abilities;
        self
    }

    /// The weapon in the single dominant hand
    pub fn dominant_weapon(&self) -> Result<&WeaponId> {
        let mut dominant = self.hands.iter().filter(|h| h.dominant);
        let first = dominant
            .next()
            .ok_or_else(|| SkirmishError::NoDominantHand(self.name.clone()))?;
        let extra = dominant.count();
        if extra > 0 {
            return Err(SkirmishError::MultipleDominantHands {
                name: self.name.clone(),
                count: extra + 1,
            });
        }
        Ok(&first.weapon)
    }
}

/// A live combatant in the world registry
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub controller: Controller,
    pub is_enemy: bool,
    pub level: u32,
    pub animation_speed: f32,
    pub health: HealthTracker,
    pub offense: OffenseController,
    pub defense: DefenseResolver,
    /// AI only
    pub director: Option<CombatantDirector>,
    pub abilities: Option<SpecialAbilities>,
    pub formation: Option<FormationId>,
}

impl Combatant {
    /// Validate a blueprint against the armory and build the record
    pub fn from_blueprint(id: CombatantId, blueprint: &CombatantBlueprint, armory: &Armory) -> Result<Self> {
        let weapon = blueprint.dominant_weapon()?;
        armory.weapon(weapon)?;
        for piece in blueprint.armor.pieces() {
            armory.armor(piece)?;
        }
        if blueprint.max_health.is_nan() || blueprint.max_health <= 0.0 {
            return Err(SkirmishError::InvalidConfig(format!(
                "{} needs a positive max_health, got {}",
                blueprint.name, blueprint.max_health
            )));
        }

        let is_player = blueprint.controller == Controller::Player;
        let director = if is_player {
            None
        } else {
            let patrol = if blueprint.patrol.is_empty() {
                None
            } else {
                Some(PatrolRoute::new(blueprint.patrol.clone(), &blueprint.name)?)
            };
            Some(CombatantDirector::new(blueprint.director.clone(), patrol))
        };
        let abilities = if blueprint.abilities.is_empty() {
            None
        } else {
            Some(SpecialAbilities::new(&blueprint.stamina, blueprint.abilities.clone()))
        };

        Ok(Self {
            id,
            name: blueprint.name.clone(),
            controller: blueprint.controller,
            is_enemy: !is_player && blueprint.is_enemy,
            level: blueprint.level,
            animation_speed: blueprint.animation_speed,
            health: HealthTracker::new(blueprint.max_health),
            offense: OffenseController::new(weapon.clone(), blueprint.attack_bonus, blueprint.base_damage),
            defense: DefenseResolver::new(blueprint.block_bonus, blueprint.armor.clone()),
            director,
            abilities,
            formation: None,
        })
    }

    pub fn is_player(&self) -> bool {
        self.controller == Controller::Player
    }

    pub fn is_ai(&self) -> bool {
        self.controller == Controller::Ai
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    /// May this combatant treat `other` as an opponent?
    ///
    /// Two AI combatants are opponents when their allegiances differ. The
    /// player is an opponent of enemy AI only, and vice versa.
    pub fn is_valid_opponent(&self, other: &Combatant) -> bool {
        if self.id == other.id {
            return false;
        }
        match (self.controller, other.controller) {
            (Controller::Ai, Controller::Ai) => self.is_enemy != other.is_enemy,
            (Controller::Ai, Controller::Player) => self.is_enemy,
            (Controller::Player, Controller::Ai) => other.is_enemy,
            (Controller::Player, Controller::Player) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ArmorId;

    fn spawn(id: u32, blueprint: CombatantBlueprint) -> Combatant {
        Combatant::from_blueprint(CombatantId(id), &blueprint, &Armory::with_defaults())
            .expect("blueprint should be valid")
    }

    #[test]
    fn test_no_dominant_hand_rejected() {
        let mut blueprint = CombatantBlueprint::ai("lefty", "sword");
        blueprint.hands[0].dominant = false;
        let result = Combatant::from_blueprint(CombatantId(1), &blueprint, &Armory::with_defaults());
        assert!(matches!(result, Err(SkirmishError::NoDominantHand(_))));
    }

    #[test]
    fn test_two_dominant_hands_rejected() {
        let mut blueprint = CombatantBlueprint::ai("ambi", "sword");
        blueprint.hands.push(HandSlot { weapon: WeaponId::new("mace"), dominant: true });
        let result = Combatant::from_blueprint(CombatantId(1), &blueprint, &Armory::with_defaults());
        assert!(matches!(result, Err(SkirmishError::MultipleDominantHands { count: 2, .. })));
    }

    #[test]
    fn test_unknown_weapon_and_armor_rejected() {
        let armory = Armory::with_defaults();
        let blueprint = CombatantBlueprint::ai("odd", "halberd");
        assert!(matches!(
            Combatant::from_blueprint(CombatantId(1), &blueprint, &armory),
            Err(SkirmishError::UnknownWeapon(_))
        ));

        let blueprint = CombatantBlueprint::ai("odd", "sword").with_armor(ArmorLoadout::full(ArmorId::new("mithril")));
        assert!(matches!(
            Combatant::from_blueprint(CombatantId(1), &blueprint, &armory),
            Err(SkirmishError::UnknownArmor(_))
        ));
    }

    #[test]
    fn test_off_hand_weapon_ignored() {
        let mut blueprint = CombatantBlueprint::ai("duelist", "sword");
        blueprint.hands.push(HandSlot { weapon: WeaponId::new("mace"), dominant: false });
        let combatant = spawn(1, blueprint);
        assert_eq!(combatant.offense.weapon(), &WeaponId::new("sword"));
    }

    #[test]
    fn test_player_has_no_director_and_is_never_enemy() {
        let player = spawn(1, CombatantBlueprint::player("hero", "sword").hostile());
        assert!(player.director.is_none());
        assert!(!player.is_enemy);
    }

    #[test]
    fn test_opponent_rules() {
        let player = spawn(1, CombatantBlueprint::player("hero", "sword"));
        let bandit = spawn(2, CombatantBlueprint::ai("bandit", "sword").hostile());
        let guard = spawn(3, CombatantBlueprint::ai("guard", "spear"));
        let other_guard = spawn(4, CombatantBlueprint::ai("guard", "spear"));

        assert!(bandit.is_valid_opponent(&player));
        assert!(player.is_valid_opponent(&bandit));
        assert!(!guard.is_valid_opponent(&player));
        assert!(!player.is_valid_opponent(&guard));
        assert!(bandit.is_valid_opponent(&guard));
        assert!(guard.is_valid_opponent(&bandit));
        assert!(!guard.is_valid_opponent(&other_guard));
        assert!(!bandit.is_valid_opponent(&bandit));
    }

    #[test]
    fn test_blueprint_from_toml() {
        let blueprint: CombatantBlueprint = toml::from_str(
            r#"
            name = "archer"
            is_enemy = true
            patrol = [{ x = 0.0, y = 0.0 }, { x = 5.0, y = 0.0 }]

            [[hands]]
            weapon = "bow"
            dominant = true
            "#,
        )
        .expect("blueprint should parse");
        let combatant = spawn(7, blueprint);
        assert!(combatant.is_enemy);
        assert_eq!(combatant.health.max(), DEFAULT_MAX_HEALTH);
        assert!(combatant.director.as_ref().and_then(|d| d.patrol()).is_some());
    }
}
