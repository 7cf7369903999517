//! Skirmish - combat resolution and combatant AI core
//!
//! Engine-independent model of a melee RPG fight: attack/defend rolls,
//! armor mitigation, per-tick AI decisions, formations and special abilities.
//! Movement, animation and audio live behind the [`simulation::Environment`]
//! trait.

pub mod abilities;
pub mod ai;
pub mod combat;
pub mod core;
pub mod formation;
pub mod simulation;

pub use crate::core::error::{Result, SkirmishError};
pub use crate::core::types::{CombatantId, FormationId, Vec2};
pub use simulation::{CombatEvent, Environment, Sandbox, World};
