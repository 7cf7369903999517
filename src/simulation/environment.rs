//! Host capabilities consumed by the combat core
//!
//! Movement, physics queries and presentation belong to whatever engine hosts
//! the simulation. The core only calls these methods; every call is
//! fire-and-forget except the queries.

use serde::{Deserialize, Serialize};

use crate::combat::body_zone::HitLocation;
use crate::combat::weapons::AttackKind;
use crate::core::types::{CombatantId, Vec2};

/// Presentation cue (animation, sound, particles)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feedback {
    Attack(AttackKind),
    Block,
    Hit(HitLocation),
    Death,
    Ability(String),
}

pub trait Environment {
    /// Put a body at a position (spawn, formation placement)
    fn place(&mut self, id: CombatantId, position: Vec2, facing: Vec2);

    fn position(&self, id: CombatantId) -> Option<Vec2>;

    /// Unit vector the combatant is facing
    fn facing(&self, id: CombatantId) -> Option<Vec2>;

    /// Every body within `radius` of `center`; allegiance filtering is done by the caller
    fn combatants_in_radius(&self, center: Vec2, radius: f32) -> Vec<CombatantId>;

    /// Start walking; completion is inferred from distance checks
    fn move_towards(&mut self, id: CombatantId, destination: Vec2);

    fn stop(&mut self, id: CombatantId);

    fn face_towards(&mut self, id: CombatantId, point: Vec2);

    fn is_reachable(&self, id: CombatantId, point: Vec2) -> bool;

    fn play_feedback(&mut self, id: CombatantId, feedback: Feedback);

    /// Remove the body from the scene
    fn despawn(&mut self, id: CombatantId);

    /// Host hook run at the start of every world tick
    fn advance(&mut self, _dt: f32) {}

    fn distance(&self, a: CombatantId, b: CombatantId) -> Option<f32> {
        Some(self.position(a)?.distance(&self.position(b)?))
    }
}
