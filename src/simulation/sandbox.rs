//! Minimal kinematic environment for tests and the demo binary
//!
//! Bodies walk in straight lines at a fixed speed and turn to face where
//! they walk. There is no collision and every point is reachable unless
//! explicitly blocked.

use ahash::AHashMap;

use crate::core::types::{CombatantId, Vec2};
use crate::simulation::environment::{Environment, Feedback};

const REACH_EPSILON: f32 = 0.01;

#[derive(Debug, Clone)]
struct Body {
    position: Vec2,
    facing: Vec2,
    destination: Option<Vec2>,
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    bodies: AHashMap<CombatantId, Body>,
    /// Walking speed in units per second
    pub speed: f32,
    blocked: Vec<Vec2>,
    feedback: Vec<(CombatantId, Feedback)>,
    despawned: Vec<CombatantId>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(3.5)
    }
}

impl Sandbox {
    pub fn new(speed: f32) -> Self {
        Self {
            bodies: AHashMap::new(),
            speed,
            blocked: Vec::new(),
            feedback: Vec::new(),
            despawned: Vec::new(),
        }
    }

    /// Mark a point as unreachable for every body
    pub fn block(&mut self, point: Vec2) {
        self.blocked.push(point);
    }

    pub fn set_position(&mut self, id: CombatantId, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
            body.destination = None;
        }
    }

    pub fn set_facing(&mut self, id: CombatantId, facing: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.facing = facing.normalize();
        }
    }

    pub fn destination(&self, id: CombatantId) -> Option<Vec2> {
        self.bodies.get(&id).and_then(|b| b.destination)
    }

    /// Every feedback cue played so far
    pub fn feedback_log(&self) -> &[(CombatantId, Feedback)] {
        &self.feedback
    }

    pub fn feedback_for(&self, id: CombatantId) -> impl Iterator<Item = &Feedback> {
        self.feedback.iter().filter(move |(who, _)| *who == id).map(|(_, f)| f)
    }

    pub fn despawned(&self) -> &[CombatantId] {
        &self.despawned
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.bodies.contains_key(&id)
    }
}

impl Environment for Sandbox {
    fn place(&mut self, id: CombatantId, position: Vec2, facing: Vec2) {
        self.bodies.insert(
            id,
            Body {
                position,
                facing: facing.normalize(),
                destination: None,
            },
        );
    }

    fn position(&self, id: CombatantId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.position)
    }

    fn facing(&self, id: CombatantId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.facing)
    }

    fn combatants_in_radius(&self, center: Vec2, radius: f32) -> Vec<CombatantId> {
        let mut found: Vec<CombatantId> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.position.distance(&center) <= radius)
            .map(|(id, _)| *id)
            .collect();
        found.sort();
        found
    }

    fn move_towards(&mut self, id: CombatantId, destination: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.destination = Some(destination);
        }
    }

    fn stop(&mut self, id: CombatantId) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.destination = None;
        }
    }

    fn face_towards(&mut self, id: CombatantId, point: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            let dir = (point - body.position).normalize();
            if dir.length() > 0.0 {
                body.facing = dir;
            }
        }
    }

    fn is_reachable(&self, _id: CombatantId, point: Vec2) -> bool {
        !self.blocked.iter().any(|b| b.distance(&point) <= REACH_EPSILON)
    }

    fn play_feedback(&mut self, id: CombatantId, feedback: Feedback) {
        self.feedback.push((id, feedback));
    }

    fn despawn(&mut self, id: CombatantId) {
        if self.bodies.remove(&id).is_some() {
            self.despawned.push(id);
        }
    }

    fn advance(&mut self, dt: f32) {
        let step = self.speed * dt;
        for body in self.bodies.values_mut() {
            let Some(destination) = body.destination else {
                continue;
            };
            let heading = (destination - body.position).normalize();
            if heading.length() > 0.0 {
                body.facing = heading;
            }
            body.position = body.position.move_towards(&destination, step);
            if body.position.distance(&destination) <= REACH_EPSILON {
                body.destination = None;
            }
        }
    }
}
