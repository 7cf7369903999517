//! Combat system constants - default stats for freshly spawned combatants
//!
//! Global tuning that designers adjust per scene lives in `CombatConfig`;
//! these are the per-combatant and per-profile starting values.

// Combatant stats
pub const DEFAULT_MAX_HEALTH: f32 = 100.0;
pub const DEFAULT_ATTACK_BONUS: f32 = 100.0;
pub const DEFAULT_BLOCK_BONUS: f32 = 110.0;
pub const DEFAULT_BASE_DAMAGE: f32 = 220.0;
pub const DEFAULT_ANIMATION_SPEED: f32 = 1.0;
pub const DEFAULT_LEVEL: u32 = 1;

// AI perception
pub const DEFAULT_AGGRO_DISTANCE: f32 = 10.0;
pub const DEFAULT_WAYPOINT_TOLERANCE: f32 = 3.0;
pub const DEFAULT_WAYPOINT_DWELL: f32 = 0.5;

// Weapon profile defaults
pub const DEFAULT_WEAPON_QUALITY: f32 = 0.8;
pub const DEFAULT_WEAPON_CONDITION: f32 = 0.8;
pub const DEFAULT_DAMAGE_MODIFIER: f32 = 0.5;
pub const DEFAULT_ATTACK_RANGE: f32 = 2.0;
pub const DEFAULT_DAMAGE_DELAY: f32 = 0.5;
pub const DEFAULT_BLOCK_DELAY: f32 = 0.25;
pub const DEFAULT_CYCLE_SECONDS: f32 = 1.0;
pub const DEFAULT_SWING_SECONDS: f32 = 1.0;

// Armor profile defaults
pub const DEFAULT_ARMOR_QUALITY: f32 = 0.8;
pub const DEFAULT_ARMOR_CONDITION: f32 = 0.8;
pub const DEFAULT_ARMOR_COVERAGE: f32 = 0.4;
pub const DEFAULT_ARMOR_AMOUNT: f32 = 20.0;

// Directional arcs (degrees from the defender's facing)
pub const FRONT_ARC_DEGREES: f32 = 45.0;
pub const SIDE_ARC_DEGREES: f32 = 135.0;

/// Floor on the wait between attack cycles
pub const MIN_ATTACK_CYCLE_SECONDS: f32 = 0.05;
